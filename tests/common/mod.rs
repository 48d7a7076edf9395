//! Minimal EXIF JPEG builder for end-to-end tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

const SHORT: u16 = 3;
const ASCII: u16 = 2;
const LONG: u16 = 4;

const TAG_ORIENTATION: u16 = 0x0112;
const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_DATE_TIME_DIGITIZED: u16 = 0x9004;

/// Dates to embed; `None` leaves the tag out
#[derive(Debug, Clone, Copy, Default)]
pub struct Dates<'a> {
    pub date_time: Option<&'a str>,
    pub digitized: Option<&'a str>,
    pub original: Option<&'a str>,
}

fn ifd_len(entries: usize) -> u32 {
    (2 + 12 * entries + 4) as u32
}

fn push_entry(ifd: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    ifd.extend_from_slice(&tag.to_le_bytes());
    ifd.extend_from_slice(&kind.to_le_bytes());
    ifd.extend_from_slice(&count.to_le_bytes());
    ifd.extend_from_slice(&value.to_le_bytes());
}

fn push_ascii(ifd: &mut Vec<u8>, data: &mut Vec<u8>, data_base: u32, tag: u16, text: &str) {
    let offset = data_base + data.len() as u32;
    push_entry(ifd, tag, ASCII, text.len() as u32 + 1, offset);
    data.extend_from_slice(text.as_bytes());
    data.push(0);
}

/// Little-endian TIFF block with IFD0 and, when needed, an Exif sub-IFD
pub fn exif_tiff(dates: Dates) -> Vec<u8> {
    let exif_count = dates.original.is_some() as usize + dates.digitized.is_some() as usize;
    let ifd0_count = 1 + dates.date_time.is_some() as usize + (exif_count > 0) as usize;

    let ifd0_offset = 8u32;
    let exif_offset = ifd0_offset + ifd_len(ifd0_count);
    let data_base = exif_offset + if exif_count > 0 { ifd_len(exif_count) } else { 0 };

    let mut data = Vec::new();

    let mut ifd0 = (ifd0_count as u16).to_le_bytes().to_vec();
    push_entry(&mut ifd0, TAG_ORIENTATION, SHORT, 1, 1);
    if let Some(text) = dates.date_time {
        push_ascii(&mut ifd0, &mut data, data_base, TAG_DATE_TIME, text);
    }
    if exif_count > 0 {
        push_entry(&mut ifd0, TAG_EXIF_IFD, LONG, 1, exif_offset);
    }
    ifd0.extend_from_slice(&0u32.to_le_bytes());

    let mut exif_ifd = Vec::new();
    if exif_count > 0 {
        exif_ifd.extend_from_slice(&(exif_count as u16).to_le_bytes());
        if let Some(text) = dates.original {
            push_ascii(&mut exif_ifd, &mut data, data_base, TAG_DATE_TIME_ORIGINAL, text);
        }
        if let Some(text) = dates.digitized {
            push_ascii(&mut exif_ifd, &mut data, data_base, TAG_DATE_TIME_DIGITIZED, text);
        }
        exif_ifd.extend_from_slice(&0u32.to_le_bytes());
    }

    let mut tiff = b"II\x2A\x00".to_vec();
    tiff.extend_from_slice(&ifd0_offset.to_le_bytes());
    tiff.extend_from_slice(&ifd0);
    tiff.extend_from_slice(&exif_ifd);
    tiff.extend_from_slice(&data);
    tiff
}

/// SOI, an Exif APP1 segment, a comment segment, fake scan data, EOI
pub fn jpeg(dates: Dates, comment: &str) -> Vec<u8> {
    let tiff = exif_tiff(dates);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\x00\x00");
    jpeg.extend_from_slice(&tiff);

    jpeg.extend_from_slice(&[0xFF, 0xFE]);
    jpeg.extend_from_slice(&((2 + comment.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(comment.as_bytes());

    jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
    jpeg.extend((0u8..=255).cycle().take(512).filter(|&b| b != 0xFF));
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

pub fn write_jpeg(dir: &Path, name: &str, dates: Dates, comment: &str) -> (PathBuf, Vec<u8>) {
    let path = dir.join(name);
    let bytes = jpeg(dates, comment);
    fs::write(&path, &bytes).unwrap();
    (path, bytes)
}

/// Byte offsets of every occurrence of `needle`
pub fn find_all(haystack: &[u8], needle: &str) -> Vec<usize> {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| *w == needle.as_bytes())
        .map(|(i, _)| i)
        .collect()
}
