//! MMTF binary array codecs
//!
//! Every encoded array starts with a 12-byte big-endian header (codec id, decoded length,
//! codec parameter) followed by big-endian payload. Decoding supports all fifteen codecs of
//! MMTF 1.0; encoding covers the subset the writer uses.

use crate::io::error::Error;

const FORMAT: &str = "MMTF";
const HEADER_LEN: usize = 12;

// Codec ids (MMTF 1.0)
pub const CODEC_FLOAT32: i32 = 1;
pub const CODEC_INT8: i32 = 2;
pub const CODEC_INT16: i32 = 3;
pub const CODEC_INT32: i32 = 4;
pub const CODEC_STRING: i32 = 5;
pub const CODEC_RUN_LENGTH_CHAR: i32 = 6;
pub const CODEC_RUN_LENGTH_INT32: i32 = 7;
pub const CODEC_RUN_LENGTH_DELTA_INT32: i32 = 8;
pub const CODEC_RUN_LENGTH_FLOAT: i32 = 9;
pub const CODEC_DELTA_RECURSIVE_FLOAT: i32 = 10;
pub const CODEC_INT16_FLOAT: i32 = 11;
pub const CODEC_RECURSIVE_INT16_FLOAT: i32 = 12;
pub const CODEC_RECURSIVE_INT8_FLOAT: i32 = 13;
pub const CODEC_RECURSIVE_INT16: i32 = 14;
pub const CODEC_RECURSIVE_INT8: i32 = 15;

/// Parsed 12-byte array header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub codec: i32,
    pub length: usize,
    pub param: i32,
}

fn split_header(bytes: &[u8]) -> Result<(Header, &[u8]), Error> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::codec(
            FORMAT,
            format!("encoded array of {} bytes lacks a header", bytes.len()),
        ));
    }
    let word = |i: usize| i32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    let length = usize::try_from(word(4))
        .map_err(|_| Error::codec(FORMAT, format!("negative array length {}", word(4))))?;

    Ok((
        Header {
            codec: word(0),
            length,
            param: word(8),
        },
        &bytes[HEADER_LEN..],
    ))
}

fn with_header(codec: i32, length: usize, param: i32, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&codec.to_be_bytes());
    out.extend_from_slice(&(length as i32).to_be_bytes());
    out.extend_from_slice(&param.to_be_bytes());
    out.extend(payload);
    out
}

// ---------------------------------------------------------------------------
// Primitive steps
// ---------------------------------------------------------------------------

fn be_i8(payload: &[u8]) -> Vec<i32> {
    payload.iter().map(|&b| b as i8 as i32).collect()
}

fn be_i16(payload: &[u8]) -> Vec<i32> {
    payload
        .chunks_exact(2)
        .map(|c| i16::from_be_bytes([c[0], c[1]]) as i32)
        .collect()
}

fn be_i32(payload: &[u8]) -> Vec<i32> {
    payload
        .chunks_exact(4)
        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn be_f32(payload: &[u8]) -> Vec<f32> {
    payload
        .chunks_exact(4)
        .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// RunLength: expand (value, count) pairs
fn run_length(ints: &[i32]) -> Result<Vec<i32>, Error> {
    if ints.len() % 2 != 0 {
        return Err(Error::codec(FORMAT, "run-length array has an odd length"));
    }
    let mut result = Vec::new();
    for pair in ints.chunks_exact(2) {
        let count = usize::try_from(pair[1])
            .map_err(|_| Error::codec(FORMAT, format!("negative run length {}", pair[1])))?;
        result.extend(std::iter::repeat_n(pair[0], count));
    }
    Ok(result)
}

/// Delta: cumulative sum starting at zero
fn delta(ints: Vec<i32>) -> Vec<i32> {
    let mut current = 0i32;
    ints.into_iter()
        .map(|v| {
            current = current.wrapping_add(v);
            current
        })
        .collect()
}

/// RecursiveIndex: values at the packed range boundary continue into the next element.
fn recursive_index(ints: &[i32], max: i32, min: i32) -> Vec<i32> {
    let mut result = Vec::with_capacity(ints.len());
    let mut acc = 0i32;
    for &v in ints {
        acc = acc.wrapping_add(v);
        if v != max && v != min {
            result.push(acc);
            acc = 0;
        }
    }
    result
}

fn divide(ints: Vec<i32>, divisor: i32) -> Result<Vec<f32>, Error> {
    if divisor == 0 {
        return Err(Error::codec(FORMAT, "integer division codec with divisor 0"));
    }
    let divisor = divisor as f32;
    Ok(ints.into_iter().map(|v| v as f32 / divisor).collect())
}

fn check_length<T>(values: Vec<T>, header: &Header) -> Result<Vec<T>, Error> {
    if values.len() != header.length {
        return Err(Error::codec(
            FORMAT,
            format!(
                "codec {} decoded {} values, header announces {}",
                header.codec,
                values.len(),
                header.length
            ),
        ));
    }
    Ok(values)
}

fn unexpected(header: &Header, expected: &str) -> Error {
    Error::codec(
        FORMAT,
        format!("codec {} does not produce {}", header.codec, expected),
    )
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

/// Decodes an array of floating point values (codecs 1, 9, 10, 11, 12, 13).
pub fn decode_floats(bytes: &[u8]) -> Result<Vec<f32>, Error> {
    let (header, payload) = split_header(bytes)?;
    let values = match header.codec {
        CODEC_FLOAT32 => be_f32(payload),
        CODEC_RUN_LENGTH_FLOAT => divide(run_length(&be_i32(payload))?, header.param)?,
        CODEC_DELTA_RECURSIVE_FLOAT => divide(
            delta(recursive_index(&be_i16(payload), i16::MAX as i32, i16::MIN as i32)),
            header.param,
        )?,
        CODEC_INT16_FLOAT => divide(be_i16(payload), header.param)?,
        CODEC_RECURSIVE_INT16_FLOAT => divide(
            recursive_index(&be_i16(payload), i16::MAX as i32, i16::MIN as i32),
            header.param,
        )?,
        CODEC_RECURSIVE_INT8_FLOAT => divide(
            recursive_index(&be_i8(payload), i8::MAX as i32, i8::MIN as i32),
            header.param,
        )?,
        _ => return Err(unexpected(&header, "floats")),
    };
    check_length(values, &header)
}

/// Decodes an array of integers (codecs 2, 3, 4, 7, 8, 14, 15).
pub fn decode_ints(bytes: &[u8]) -> Result<Vec<i32>, Error> {
    let (header, payload) = split_header(bytes)?;
    let values = match header.codec {
        CODEC_INT8 => be_i8(payload),
        CODEC_INT16 => be_i16(payload),
        CODEC_INT32 => be_i32(payload),
        CODEC_RUN_LENGTH_INT32 => run_length(&be_i32(payload))?,
        CODEC_RUN_LENGTH_DELTA_INT32 => delta(run_length(&be_i32(payload))?),
        CODEC_RECURSIVE_INT16 => {
            recursive_index(&be_i16(payload), i16::MAX as i32, i16::MIN as i32)
        }
        CODEC_RECURSIVE_INT8 => recursive_index(&be_i8(payload), i8::MAX as i32, i8::MIN as i32),
        _ => return Err(unexpected(&header, "integers")),
    };
    check_length(values, &header)
}

/// Decodes fixed-length, NUL-padded strings (codec 5).
pub fn decode_strings(bytes: &[u8]) -> Result<Vec<String>, Error> {
    let (header, payload) = split_header(bytes)?;
    if header.codec != CODEC_STRING {
        return Err(unexpected(&header, "strings"));
    }
    let width = usize::try_from(header.param)
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| Error::codec(FORMAT, format!("invalid string width {}", header.param)))?;

    let values = payload
        .chunks_exact(width)
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
            String::from_utf8_lossy(&chunk[..end]).into_owned()
        })
        .collect();
    check_length(values, &header)
}

/// Decodes run-length encoded characters (codec 6); NUL means "no character".
pub fn decode_chars(bytes: &[u8]) -> Result<Vec<Option<char>>, Error> {
    let (header, payload) = split_header(bytes)?;
    if header.codec != CODEC_RUN_LENGTH_CHAR {
        return Err(unexpected(&header, "characters"));
    }
    let values = run_length(&be_i32(payload))?
        .into_iter()
        .map(|code| {
            u32::try_from(code)
                .ok()
                .filter(|c| *c != 0)
                .and_then(char::from_u32)
        })
        .collect();
    check_length(values, &header)
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

fn run_length_pairs(values: &[i32]) -> Vec<i32> {
    let mut pairs = Vec::new();
    let mut iter = values.iter().copied();
    let Some(mut current) = iter.next() else {
        return pairs;
    };
    let mut count = 1;
    for v in iter {
        if v == current {
            count += 1;
        } else {
            pairs.push(current);
            pairs.push(count);
            current = v;
            count = 1;
        }
    }
    pairs.push(current);
    pairs.push(count);
    pairs
}

fn i32_payload(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Splits each value into int16 pieces; out-of-range values become boundary runs.
fn recursive_index_i16(values: &[i32]) -> Vec<i16> {
    let mut out = Vec::with_capacity(values.len());
    for &v in values {
        let mut rest = v;
        while rest >= i16::MAX as i32 {
            out.push(i16::MAX);
            rest -= i16::MAX as i32;
        }
        while rest <= i16::MIN as i32 {
            out.push(i16::MIN);
            rest -= i16::MIN as i32;
        }
        out.push(rest as i16);
    }
    out
}

fn scale(values: &[f64], divisor: i32) -> Vec<i32> {
    values
        .iter()
        .map(|v| (v * divisor as f64).round() as i32)
        .collect()
}

/// Codec 2: signed bytes.
pub fn encode_int8(values: &[i8]) -> Vec<u8> {
    let payload = values.iter().map(|&v| v as u8).collect();
    with_header(CODEC_INT8, values.len(), 0, payload)
}

/// Codec 4: big-endian int32.
pub fn encode_int32(values: &[i32]) -> Vec<u8> {
    with_header(CODEC_INT32, values.len(), 0, i32_payload(values))
}

/// Codec 5: fixed-width strings, truncated or NUL-padded to `width` bytes.
pub fn encode_strings<S: AsRef<str>>(values: &[S], width: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(values.len() * width);
    for value in values {
        let bytes = value.as_ref().as_bytes();
        let take = bytes.len().min(width);
        payload.extend_from_slice(&bytes[..take]);
        payload.extend(std::iter::repeat_n(0u8, width - take));
    }
    with_header(CODEC_STRING, values.len(), width as i32, payload)
}

/// Codec 6: run-length encoded characters, `None` written as NUL.
pub fn encode_run_length_chars(values: &[Option<char>]) -> Vec<u8> {
    let codes: Vec<i32> = values
        .iter()
        .map(|c| c.map(|c| c as i32).unwrap_or(0))
        .collect();
    with_header(
        CODEC_RUN_LENGTH_CHAR,
        values.len(),
        0,
        i32_payload(&run_length_pairs(&codes)),
    )
}

/// Codec 8: delta followed by run-length encoding of int32 values.
pub fn encode_run_length_delta(values: &[i32]) -> Vec<u8> {
    let mut previous = 0i32;
    let deltas: Vec<i32> = values
        .iter()
        .map(|&v| {
            let d = v.wrapping_sub(previous);
            previous = v;
            d
        })
        .collect();
    with_header(
        CODEC_RUN_LENGTH_DELTA_INT32,
        values.len(),
        0,
        i32_payload(&run_length_pairs(&deltas)),
    )
}

/// Codec 9: values scaled by `divisor`, rounded, then run-length encoded.
pub fn encode_run_length_float(values: &[f64], divisor: i32) -> Vec<u8> {
    with_header(
        CODEC_RUN_LENGTH_FLOAT,
        values.len(),
        divisor,
        i32_payload(&run_length_pairs(&scale(values, divisor))),
    )
}

/// Codec 10: values scaled by `divisor`, delta encoded, then split into int16 pieces.
pub fn encode_delta_recursive_float(values: &[f64], divisor: i32) -> Vec<u8> {
    let scaled = scale(values, divisor);
    let mut previous = 0i32;
    let deltas: Vec<i32> = scaled
        .iter()
        .map(|&v| {
            let d = v.wrapping_sub(previous);
            previous = v;
            d
        })
        .collect();
    let payload = recursive_index_i16(&deltas)
        .into_iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    with_header(CODEC_DELTA_RECURSIVE_FLOAT, values.len(), divisor, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(codec: i32, length: i32, param: i32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&codec.to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&param.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn i16s(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    fn i32s(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn test_decode_float32() {
        let payload: Vec<u8> = [1.5f32, -2.25].iter().flat_map(|v| v.to_be_bytes()).collect();
        let values = decode_floats(&raw(1, 2, 0, &payload)).unwrap();
        assert_eq!(values, vec![1.5, -2.25]);
    }

    #[test]
    fn test_decode_run_length_delta() {
        // 1, 2, 3, 4, 5, 10 -> deltas 1x5, 5x1
        let bytes = raw(8, 6, 0, &i32s(&[1, 5, 5, 1]));
        assert_eq!(decode_ints(&bytes).unwrap(), vec![1, 2, 3, 4, 5, 10]);
    }

    #[test]
    fn test_decode_delta_recursive_float() {
        // 32767 + 10 = 32777 -> 32.777, then delta -100 -> 32.677
        let bytes = raw(10, 2, 1000, &i16s(&[32767, 10, -100]));
        let values = decode_floats(&bytes).unwrap();
        assert!((values[0] - 32.777).abs() < 1e-4);
        assert!((values[1] - 32.677).abs() < 1e-4);
    }

    #[test]
    fn test_decode_recursive_int8() {
        let bytes = raw(15, 3, 0, &[127, 1, 5, 0x80, 0xff]);
        // 127+1 = 128, 5, -128 + -1 = -129
        assert_eq!(decode_ints(&bytes).unwrap(), vec![128, 5, -129]);
    }

    #[test]
    fn test_decode_run_length_float() {
        let bytes = raw(9, 3, 100, &i32s(&[100, 2, 50, 1]));
        assert_eq!(decode_floats(&bytes).unwrap(), vec![1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_decode_int16_float() {
        let bytes = raw(11, 2, 10, &i16s(&[15, -5]));
        assert_eq!(decode_floats(&bytes).unwrap(), vec![1.5, -0.5]);
    }

    #[test]
    fn test_decode_strings_strip_padding() {
        let bytes = raw(5, 2, 4, b"A\0\0\0BB\0\0");
        assert_eq!(decode_strings(&bytes).unwrap(), vec!["A", "BB"]);
    }

    #[test]
    fn test_decode_chars_maps_nul_to_none() {
        let bytes = raw(6, 3, 0, &i32s(&[0, 2, 'A' as i32, 1]));
        assert_eq!(decode_chars(&bytes).unwrap(), vec![None, None, Some('A')]);
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let bytes = raw(4, 3, 0, &i32s(&[1, 2]));
        assert!(matches!(decode_ints(&bytes), Err(Error::Codec { .. })));
    }

    #[test]
    fn test_decode_rejects_wrong_target_type() {
        let bytes = raw(4, 1, 0, &i32s(&[1]));
        assert!(decode_floats(&bytes).is_err());
        assert!(decode_ints(&raw(99, 0, 0, &[])).is_err());
        assert!(decode_ints(&[0, 0, 0]).is_err());
    }

    #[test]
    fn test_encode_delta_recursive_float_splits_large_steps() {
        let bytes = encode_delta_recursive_float(&[40.0, -40.0], 1000);
        let (header, payload) = split_header(&bytes).unwrap();
        assert_eq!(header.codec, 10);
        assert_eq!(header.length, 2);
        assert_eq!(header.param, 1000);
        // 40000 = 32767 + 7233; -80000 = -32768 * 2 - 14464
        assert_eq!(be_i16(payload), vec![32767, 7233, -32768, -32768, -14464]);

        let decoded = decode_floats(&bytes).unwrap();
        assert!((decoded[0] - 40.0).abs() < 1e-3);
        assert!((decoded[1] + 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_encode_run_length_delta_compresses_sequences() {
        let bytes = encode_run_length_delta(&[1, 2, 3, 4, 5, 10]);
        let (_, payload) = split_header(&bytes).unwrap();
        assert_eq!(be_i32(payload), vec![1, 5, 5, 1]);
    }

    #[test]
    fn test_encode_strings_truncates_and_pads() {
        let bytes = encode_strings(&["A", "LONGER"], 4);
        let (header, payload) = split_header(&bytes).unwrap();
        assert_eq!(header.param, 4);
        assert_eq!(payload, b"A\0\0\0LONG");
    }

    #[test]
    fn test_encode_run_length_chars() {
        let bytes = encode_run_length_chars(&[None, None, Some('B')]);
        assert_eq!(
            decode_chars(&bytes).unwrap(),
            vec![None, None, Some('B')]
        );
    }

    #[test]
    fn test_encode_empty_arrays() {
        assert_eq!(decode_floats(&encode_run_length_float(&[], 100)).unwrap(), vec![]);
        assert_eq!(decode_ints(&encode_int32(&[])).unwrap(), Vec::<i32>::new());
        assert_eq!(decode_ints(&encode_int8(&[-1, 3])).unwrap(), vec![-1, 3]);
    }
}
