//! Test fixtures: generated images and chunked sources.

use std::io::{self, Cursor};
use std::time::Duration;

use bytes::Bytes;
use futures::{stream, StreamExt};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use stowage_receiver::IncomingFile;

/// PNG of the given dimensions with a horizontal gradient.
pub fn png(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, _| {
        Rgb([(x % 256) as u8, 128, 255 - (x % 256) as u8])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    Bytes::from(buffer)
}

pub fn dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).expect("Failed to decode stored image");
    (img.width(), img.height())
}

/// Incoming file delivered in chunks of `chunk_size` bytes.
pub fn chunked(id: &str, data: Bytes, chunk_size: usize) -> IncomingFile {
    let chunks: Vec<io::Result<Bytes>> = data
        .chunks(chunk_size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    IncomingFile::new(id, stream::iter(chunks))
}

/// Incoming file whose source fails after `good` bytes.
pub fn failing_after(id: &str, data: Bytes, good: usize) -> IncomingFile {
    let items: Vec<io::Result<Bytes>> = vec![
        Ok(data.slice(..good.min(data.len()))),
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "producer disconnected")),
    ];
    IncomingFile::new(id, stream::iter(items))
}

/// Incoming file delivering `chunks` copies of `chunk`, pausing before each.
pub fn slow(id: &str, chunk: &'static [u8], chunks: usize, pause: Duration) -> IncomingFile {
    let items = stream::iter(0..chunks).then(move |_| async move {
        tokio::time::sleep(pause).await;
        Ok::<_, io::Error>(Bytes::from_static(chunk))
    });
    IncomingFile::new(id, items)
}
