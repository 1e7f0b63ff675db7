//! Test fixtures: synthesized APKs and expansion files on disk.
//!
//! Builds a minimal but well-formed Android binary manifest (string pool,
//! resource map, `<manifest>` element) and wraps it in a ZIP container so
//! the real inspector code path can run against it.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

const RES_XML_TYPE: u16 = 0x0003;
const RES_STRING_POOL_TYPE: u16 = 0x0001;
const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
const ATTR_VERSION_CODE: u32 = 0x0101_021b;
const DATA_TYPE_STRING: u8 = 0x03;
const DATA_TYPE_INT_DEC: u8 = 0x10;
const NO_ENTRY: u32 = 0xffff_ffff;

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn string_pool(strings: &[&str]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for s in strings {
        offsets.push(data.len() as u32);
        let units: Vec<u16> = s.encode_utf16().collect();
        push_u16(&mut data, units.len() as u16);
        for unit in units {
            push_u16(&mut data, unit);
        }
        push_u16(&mut data, 0);
    }
    while data.len() % 4 != 0 {
        data.push(0);
    }

    let strings_start = 28u32 + strings.len() as u32 * 4;
    let mut chunk = Vec::new();
    push_u16(&mut chunk, RES_STRING_POOL_TYPE);
    push_u16(&mut chunk, 28);
    push_u32(&mut chunk, strings_start + data.len() as u32);
    push_u32(&mut chunk, strings.len() as u32);
    push_u32(&mut chunk, 0);
    push_u32(&mut chunk, 0);
    push_u32(&mut chunk, strings_start);
    push_u32(&mut chunk, 0);
    for offset in offsets {
        push_u32(&mut chunk, offset);
    }
    chunk.extend_from_slice(&data);
    chunk
}

/// Build binary manifest bytes for the given identity.
pub fn binary_manifest(application_id: &str, version_code: u32) -> Vec<u8> {
    let pool = string_pool(&["versionCode", "package", "manifest", application_id]);

    let mut resource_map = Vec::new();
    push_u16(&mut resource_map, RES_XML_RESOURCE_MAP_TYPE);
    push_u16(&mut resource_map, 8);
    push_u32(&mut resource_map, 12);
    push_u32(&mut resource_map, ATTR_VERSION_CODE);

    let mut element = Vec::new();
    push_u16(&mut element, RES_XML_START_ELEMENT_TYPE);
    push_u16(&mut element, 16);
    push_u32(&mut element, 16 + 20 + 2 * 20);
    push_u32(&mut element, 1);
    push_u32(&mut element, NO_ENTRY);
    push_u32(&mut element, NO_ENTRY);
    push_u32(&mut element, 2); // "manifest"
    push_u16(&mut element, 20);
    push_u16(&mut element, 20);
    push_u16(&mut element, 2);
    push_u16(&mut element, 0);
    push_u16(&mut element, 0);
    push_u16(&mut element, 0);
    // package="<application_id>"
    push_u32(&mut element, NO_ENTRY);
    push_u32(&mut element, 1);
    push_u32(&mut element, 3);
    push_u16(&mut element, 8);
    element.push(0);
    element.push(DATA_TYPE_STRING);
    push_u32(&mut element, 3);
    // android:versionCode=<version_code>
    push_u32(&mut element, NO_ENTRY);
    push_u32(&mut element, 0);
    push_u32(&mut element, NO_ENTRY);
    push_u16(&mut element, 8);
    element.push(0);
    element.push(DATA_TYPE_INT_DEC);
    push_u32(&mut element, version_code);

    let total = 8 + pool.len() + resource_map.len() + element.len();
    let mut doc = Vec::with_capacity(total);
    push_u16(&mut doc, RES_XML_TYPE);
    push_u16(&mut doc, 8);
    push_u32(&mut doc, total as u32);
    doc.extend_from_slice(&pool);
    doc.extend_from_slice(&resource_map);
    doc.extend_from_slice(&element);
    doc
}

/// Write an APK with the given identity at `relative_path` under `root`.
pub fn write_apk(root: &Path, relative_path: &str, application_id: &str, version_code: u32) -> PathBuf {
    let path = root.join(relative_path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let file = File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("AndroidManifest.xml", SimpleFileOptions::default())
        .unwrap();
    writer
        .write_all(&binary_manifest(application_id, version_code))
        .unwrap();
    writer
        .start_file("classes.dex", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"dex\n035\0").unwrap();
    writer.finish().unwrap();
    path
}

/// Write a plain file (e.g. an expansion file) at `relative_path`.
pub fn write_file(root: &Path, relative_path: &str) -> PathBuf {
    let path = root.join(relative_path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"obb-payload").unwrap();
    path
}
