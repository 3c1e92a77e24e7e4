//! Decoder for Android binary XML, just enough to read manifest attributes.

use anyhow::{Context, Result, bail, ensure};

const CHUNK_XML: u16 = 0x0003;
const CHUNK_STRING_POOL: u16 = 0x0001;
const CHUNK_RESOURCE_MAP: u16 = 0x0180;
const CHUNK_START_ELEMENT: u16 = 0x0102;

const UTF8_FLAG: u32 = 0x0000_0100;
const NO_INDEX: u32 = 0xFFFF_FFFF;

const TYPE_REFERENCE: u8 = 0x01;
const TYPE_STRING: u8 = 0x03;
const TYPE_INT_DEC: u8 = 0x10;
const TYPE_INT_HEX: u8 = 0x11;

const ATTR_LABEL: u32 = 0x0101_0001;
const ATTR_VERSION_CODE: u32 = 0x0101_021b;
const ATTR_VERSION_NAME: u32 = 0x0101_021c;

/// Attributes of `<manifest>` and `<application>` we care about
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ManifestAttributes {
    pub package: Option<String>,
    pub version_code: Option<i64>,
    pub version_name: Option<String>,
    pub label: Option<String>,
    /// Label given as a resource reference we cannot resolve without resources.arsc
    pub label_reference: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Str(String),
    Int(u32),
    Reference(u32),
    Other,
}

struct Bytes<'a>(&'a [u8]);

impl Bytes<'_> {
    fn u8_at(&self, offset: usize) -> Result<u8> {
        self.0
            .get(offset)
            .copied()
            .with_context(|| format!("truncated at offset {offset:#x}"))
    }

    fn u16_at(&self, offset: usize) -> Result<u16> {
        let raw = self
            .0
            .get(offset..offset + 2)
            .with_context(|| format!("truncated at offset {offset:#x}"))?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn u32_at(&self, offset: usize) -> Result<u32> {
        let raw = self
            .0
            .get(offset..offset + 4)
            .with_context(|| format!("truncated at offset {offset:#x}"))?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    fn parse(data: &Bytes<'_>, start: usize, header_size: usize, size: usize) -> Result<Self> {
        ensure!(header_size >= 28, "header of {header_size} bytes is too short");
        let count = data.u32_at(start + 8)? as usize;
        let flags = data.u32_at(start + 16)?;
        let strings_start = start + data.u32_at(start + 20)? as usize;
        let utf8 = flags & UTF8_FLAG != 0;

        // one offset entry per string must fit inside the chunk
        let capacity = (size - header_size) / 4;
        ensure!(
            count <= capacity,
            "{count} strings declared but the chunk holds at most {capacity}"
        );

        let mut strings = Vec::new();
        for i in 0..count {
            let offset = strings_start + data.u32_at(start + header_size + i * 4)? as usize;
            let value = if utf8 {
                read_utf8(data, offset)
            } else {
                read_utf16(data, offset)
            }
            .with_context(|| format!("string #{i}"))?;
            strings.push(value);
        }
        Ok(Self { strings })
    }

    fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }
}

fn read_utf16(data: &Bytes<'_>, offset: usize) -> Result<String> {
    let mut cursor = offset;
    let mut len = data.u16_at(cursor)? as usize;
    cursor += 2;
    if len & 0x8000 != 0 {
        len = ((len & 0x7FFF) << 16) | data.u16_at(cursor)? as usize;
        cursor += 2;
    }
    ensure!(
        cursor + len * 2 <= data.0.len(),
        "truncated string at offset {cursor:#x}"
    );
    let units = (0..len)
        .map(|i| data.u16_at(cursor + i * 2))
        .collect::<Result<Vec<u16>>>()?;
    String::from_utf16(&units).context("invalid UTF-16")
}

fn read_utf8(data: &Bytes<'_>, offset: usize) -> Result<String> {
    // character count, then byte count
    let (_, cursor) = read_utf8_length(data, offset)?;
    let (len, cursor) = read_utf8_length(data, cursor)?;
    let raw = data
        .0
        .get(cursor..cursor + len)
        .with_context(|| format!("truncated string at offset {cursor:#x}"))?;
    String::from_utf8(raw.to_vec()).context("invalid UTF-8")
}

fn read_utf8_length(data: &Bytes<'_>, offset: usize) -> Result<(usize, usize)> {
    let first = data.u8_at(offset)? as usize;
    if first & 0x80 == 0 {
        return Ok((first, offset + 1));
    }
    let second = data.u8_at(offset + 1)? as usize;
    Ok((((first & 0x7F) << 8) | second, offset + 2))
}

/// Decode a compiled `AndroidManifest.xml`
pub(crate) fn parse_manifest(raw: &[u8]) -> Result<ManifestAttributes> {
    let data = Bytes(raw);
    ensure!(
        data.u16_at(0)? == CHUNK_XML,
        "not a binary XML document"
    );
    let mut offset = data.u16_at(2)? as usize;

    let mut pool: Option<StringPool> = None;
    let mut resource_ids: Vec<u32> = Vec::new();
    let mut attributes = ManifestAttributes::default();
    let mut seen_manifest = false;
    let mut seen_application = false;

    while offset + 8 <= raw.len() {
        let chunk_type = data.u16_at(offset)?;
        let header_size = data.u16_at(offset + 2)? as usize;
        let size = data.u32_at(offset + 4)? as usize;
        if size < 8 || offset + size > raw.len() {
            bail!("chunk at {offset:#x} has invalid size {size}");
        }
        if header_size < 8 || header_size > size {
            bail!("chunk at {offset:#x} has invalid header size {header_size} for size {size}");
        }

        match chunk_type {
            CHUNK_STRING_POOL => {
                pool = Some(StringPool::parse(&data, offset, header_size, size).context("string pool")?)
            }
            CHUNK_RESOURCE_MAP => {
                let count = (size - header_size) / 4;
                resource_ids = (0..count)
                    .map(|i| data.u32_at(offset + header_size + i * 4))
                    .collect::<Result<_>>()?;
            }
            CHUNK_START_ELEMENT => {
                let strings = pool.as_ref().context("element before string pool")?;
                let ext = offset + header_size;
                let name = strings.get(data.u32_at(ext + 4)?).unwrap_or_default();
                let is_manifest = name == "manifest" && !seen_manifest;
                let is_application = name == "application" && !seen_application;

                if is_manifest || is_application {
                    let attribute_start = data.u16_at(ext + 8)? as usize;
                    let attribute_size = data.u16_at(ext + 10)? as usize;
                    let attribute_count = data.u16_at(ext + 12)? as usize;

                    for i in 0..attribute_count {
                        let at = ext + attribute_start + i * attribute_size;
                        let name_index = data.u32_at(at + 4)?;
                        let value = read_value(&data, strings, at)?;
                        let resource_id = resource_ids.get(name_index as usize).copied();
                        let attr_name = strings.get(name_index).unwrap_or_default();

                        if is_manifest {
                            apply_manifest_attribute(&mut attributes, resource_id, attr_name, value);
                        } else {
                            apply_application_attribute(&mut attributes, resource_id, attr_name, value);
                        }
                    }
                    seen_manifest |= is_manifest;
                    seen_application |= is_application;
                }
            }
            _ => {}
        }

        if seen_manifest && seen_application {
            break;
        }
        offset += size;
    }

    ensure!(seen_manifest, "no <manifest> element");
    Ok(attributes)
}

fn read_value(data: &Bytes<'_>, strings: &StringPool, at: usize) -> Result<Value> {
    let raw_value = data.u32_at(at + 8)?;
    if raw_value != NO_INDEX {
        if let Some(s) = strings.get(raw_value) {
            return Ok(Value::Str(s.to_string()));
        }
    }
    let data_type = data.u8_at(at + 15)?;
    let payload = data.u32_at(at + 16)?;
    Ok(match data_type {
        TYPE_STRING => strings
            .get(payload)
            .map(|s| Value::Str(s.to_string()))
            .unwrap_or(Value::Other),
        TYPE_INT_DEC | TYPE_INT_HEX => Value::Int(payload),
        TYPE_REFERENCE => Value::Reference(payload),
        _ => Value::Other,
    })
}

fn is_attribute(resource_id: Option<u32>, name: &str, id: u32, fallback: &str) -> bool {
    match resource_id {
        Some(found) if found != 0 => found == id,
        _ => name == fallback,
    }
}

fn apply_manifest_attribute(
    attributes: &mut ManifestAttributes,
    resource_id: Option<u32>,
    name: &str,
    value: Value,
) {
    if is_attribute(resource_id, name, ATTR_VERSION_CODE, "versionCode") {
        attributes.version_code = match value {
            Value::Int(code) => Some(i64::from(code)),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        };
    } else if is_attribute(resource_id, name, ATTR_VERSION_NAME, "versionName") {
        if let Value::Str(s) = value {
            attributes.version_name = Some(s);
        }
    } else if resource_id.is_none_or(|id| id == 0) && name == "package" {
        if let Value::Str(s) = value {
            attributes.package = Some(s);
        }
    }
}

fn apply_application_attribute(
    attributes: &mut ManifestAttributes,
    resource_id: Option<u32>,
    name: &str,
    value: Value,
) {
    if is_attribute(resource_id, name, ATTR_LABEL, "label") {
        match value {
            Value::Str(s) => attributes.label = Some(s),
            Value::Reference(id) => attributes.label_reference = Some(id),
            _ => {}
        }
    }
}
