//! Android binary XML (AXML) manifest parsing.
//!
//! `AndroidManifest.xml` inside an APK is not text: it is a chunked binary
//! document with a string pool, an optional resource map, and element
//! chunks whose attributes reference the pool by index. Only the
//! `<manifest>` element matters here; its `package` attribute carries the
//! application id and `android:versionCode` (resource id `0x0101021b`)
//! carries the version code.

use crate::{ApkError, ApkMetadata};

const RES_XML_TYPE: u16 = 0x0003;
const RES_STRING_POOL_TYPE: u16 = 0x0001;
const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;

/// String pool flag: strings are UTF-8 rather than UTF-16.
const UTF8_FLAG: u32 = 1 << 8;

/// Android framework resource id for `android:versionCode`.
const ATTR_VERSION_CODE: u32 = 0x0101_021b;

const DATA_TYPE_STRING: u8 = 0x03;
const DATA_TYPE_INT_DEC: u8 = 0x10;
const DATA_TYPE_INT_HEX: u8 = 0x11;

/// Sentinel for "no string" references.
const NO_ENTRY: u32 = 0xffff_ffff;

fn read_u16(data: &[u8], pos: usize) -> Result<u16, ApkError> {
    let bytes = data
        .get(pos..pos + 2)
        .ok_or_else(|| ApkError::Malformed(format!("truncated at offset {}", pos)))?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, ApkError> {
    let bytes = data
        .get(pos..pos + 4)
        .ok_or_else(|| ApkError::Malformed(format!("truncated at offset {}", pos)))?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Decoded string pool.
struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    fn get(&self, index: u32) -> Result<&str, ApkError> {
        self.strings
            .get(index as usize)
            .map(String::as_str)
            .ok_or_else(|| ApkError::Malformed(format!("string index {} out of range", index)))
    }
}

/// Parse the manifest and extract the identity attributes.
pub(crate) fn parse_manifest(data: &[u8]) -> Result<ApkMetadata, ApkError> {
    if read_u16(data, 0)? != RES_XML_TYPE {
        return Err(ApkError::Malformed("not a binary XML document".to_string()));
    }
    let header_size = read_u16(data, 2)? as usize;
    if header_size < 8 {
        return Err(ApkError::Malformed("invalid document header".to_string()));
    }

    let mut pos = header_size;
    let mut pool: Option<StringPool> = None;
    let mut resource_map: Vec<u32> = Vec::new();

    while pos + 8 <= data.len() {
        let chunk_type = read_u16(data, pos)?;
        let chunk_size = read_u32(data, pos + 4)? as usize;
        if chunk_size < 8 || pos + chunk_size > data.len() {
            return Err(ApkError::Malformed(format!(
                "chunk at offset {} has invalid size {}",
                pos, chunk_size
            )));
        }

        match chunk_type {
            RES_STRING_POOL_TYPE if pool.is_none() => {
                pool = Some(parse_string_pool(data, pos)?);
            }
            RES_XML_RESOURCE_MAP_TYPE => {
                let header = read_u16(data, pos + 2)? as usize;
                let mut offset = pos + header;
                resource_map.clear();
                while offset + 4 <= pos + chunk_size {
                    resource_map.push(read_u32(data, offset)?);
                    offset += 4;
                }
            }
            RES_XML_START_ELEMENT_TYPE => {
                let pool = pool
                    .as_ref()
                    .ok_or_else(|| ApkError::Malformed("element before string pool".to_string()))?;
                if let Some(metadata) = parse_start_element(data, pos, pool, &resource_map)? {
                    return Ok(metadata);
                }
            }
            _ => {}
        }

        pos += chunk_size;
    }

    Err(ApkError::Malformed("no <manifest> element found".to_string()))
}

fn parse_string_pool(data: &[u8], pos: usize) -> Result<StringPool, ApkError> {
    let header_size = read_u16(data, pos + 2)? as usize;
    let string_count = read_u32(data, pos + 8)? as usize;
    let flags = read_u32(data, pos + 16)?;
    let strings_start = read_u32(data, pos + 20)? as usize;
    let utf8 = flags & UTF8_FLAG != 0;

    let mut strings = Vec::with_capacity(string_count);
    for i in 0..string_count {
        let offset = read_u32(data, pos + header_size + i * 4)? as usize;
        let at = pos + strings_start + offset;
        let decoded = if utf8 {
            decode_utf8(data, at)?
        } else {
            decode_utf16(data, at)?
        };
        strings.push(decoded);
    }

    Ok(StringPool { strings })
}

fn decode_utf16(data: &[u8], pos: usize) -> Result<String, ApkError> {
    let mut at = pos;
    let mut len = read_u16(data, at)? as usize;
    at += 2;
    // Lengths >= 0x8000 spill into a second length word.
    if len & 0x8000 != 0 {
        let low = read_u16(data, at)? as usize;
        at += 2;
        len = ((len & 0x7fff) << 16) | low;
    }

    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        units.push(read_u16(data, at)?);
        at += 2;
    }
    String::from_utf16(&units)
        .map_err(|_| ApkError::Malformed("invalid UTF-16 string data".to_string()))
}

fn decode_utf8(data: &[u8], pos: usize) -> Result<String, ApkError> {
    let mut at = pos;
    // UTF-16 length, then byte length; each is one or two bytes.
    let (_, consumed) = decode_utf8_length(data, at)?;
    at += consumed;
    let (byte_len, consumed) = decode_utf8_length(data, at)?;
    at += consumed;

    let bytes = data
        .get(at..at + byte_len)
        .ok_or_else(|| ApkError::Malformed("truncated UTF-8 string data".to_string()))?;
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ApkError::Malformed("invalid UTF-8 string data".to_string()))
}

fn decode_utf8_length(data: &[u8], pos: usize) -> Result<(usize, usize), ApkError> {
    let first = *data
        .get(pos)
        .ok_or_else(|| ApkError::Malformed("truncated string length".to_string()))? as usize;
    if first & 0x80 != 0 {
        let second = *data
            .get(pos + 1)
            .ok_or_else(|| ApkError::Malformed("truncated string length".to_string()))?
            as usize;
        Ok((((first & 0x7f) << 8) | second, 2))
    } else {
        Ok((first, 1))
    }
}

fn parse_start_element(
    data: &[u8],
    pos: usize,
    pool: &StringPool,
    resource_map: &[u32],
) -> Result<Option<ApkMetadata>, ApkError> {
    let header_size = read_u16(data, pos + 2)? as usize;
    let body = pos + header_size;

    let name_index = read_u32(data, body + 4)?;
    if pool.get(name_index)? != "manifest" {
        return Ok(None);
    }

    let attribute_start = read_u16(data, body + 8)? as usize;
    let attribute_size = read_u16(data, body + 10)? as usize;
    let attribute_count = read_u16(data, body + 12)? as usize;
    if attribute_size < 20 {
        return Err(ApkError::Malformed("attribute record too small".to_string()));
    }

    let mut application_id: Option<String> = None;
    let mut version_code: Option<u64> = None;

    for i in 0..attribute_count {
        let at = body + attribute_start + i * attribute_size;
        let attr_name_index = read_u32(data, at + 4)?;
        let raw_value = read_u32(data, at + 8)?;
        let data_type = *data
            .get(at + 15)
            .ok_or_else(|| ApkError::Malformed("truncated attribute".to_string()))?;
        let typed_data = read_u32(data, at + 16)?;

        let attr_name = pool.get(attr_name_index)?;
        let resource_id = resource_map.get(attr_name_index as usize).copied();

        if attr_name == "package" {
            let value = if raw_value != NO_ENTRY {
                pool.get(raw_value)?
            } else if data_type == DATA_TYPE_STRING {
                pool.get(typed_data)?
            } else {
                return Err(ApkError::Malformed(
                    "package attribute is not a string".to_string(),
                ));
            };
            application_id = Some(value.to_string());
        } else if resource_id == Some(ATTR_VERSION_CODE)
            || (resource_id.is_none() && attr_name == "versionCode")
        {
            let value = match data_type {
                DATA_TYPE_INT_DEC | DATA_TYPE_INT_HEX => u64::from(typed_data),
                DATA_TYPE_STRING => {
                    let text = if raw_value != NO_ENTRY {
                        pool.get(raw_value)?
                    } else {
                        pool.get(typed_data)?
                    };
                    text.parse::<u64>().map_err(|_| {
                        ApkError::Malformed(format!("versionCode '{}' is not an integer", text))
                    })?
                }
                other => {
                    return Err(ApkError::Malformed(format!(
                        "versionCode has unsupported value type 0x{:02x}",
                        other
                    )))
                }
            };
            version_code = Some(value);
        }
    }

    let application_id = application_id.ok_or(ApkError::MissingAttribute("package"))?;
    let version_code = version_code.ok_or(ApkError::MissingAttribute("versionCode"))?;

    Ok(Some(ApkMetadata {
        application_id,
        version_code,
    }))
}
