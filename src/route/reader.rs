// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::Path;

use serde::Deserialize;

use super::model::{Response, Route};

/// Format of the routing API response file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed JSON
    Json,

    /// Force JSON with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    JsonGz,

    /// Force JSON with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    JsonBz2,
}

impl FileFormat {
    /// Guesses the format of a file by inspecting its first bytes.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::JsonGz
        } else if head.starts_with(b"BZh") {
            Self::JsonBz2
        } else {
            Self::Json
        }
    }
}

/// Additional controls for reading a routing API response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// Which of the route alternatives from the response should be returned.
    /// Ignored if the input is a bare route object.
    pub alternative: usize,
}

/// Error which can occur when reading a routing API response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("routing API returned {code:?}: {message}")]
    Api { code: String, message: String },

    #[error("response contains no routes")]
    NoRoutes,

    #[error("route alternative {requested} requested, but response only has {available}")]
    NoSuchAlternative { requested: usize, available: usize },
}

/// Parse a [Route] from a reader as per the provided [ReadOptions].
///
/// The input may either be a full Directions response (an object with a `routes` array)
/// or a bare route object. Route geometry must be encoded as GeoJSON (`geometries=geojson`).
///
/// The provided stream will be automatically wrapped in a buffered reader.
pub fn read_route_from_io<R: Read>(reader: R, options: &ReadOptions) -> Result<Route, Error> {
    let mut b = io::BufReader::new(reader);

    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        f => f,
    };

    let value: serde_json::Value = match format {
        FileFormat::Unknown | FileFormat::Json => serde_json::from_reader(b)?,

        FileFormat::JsonGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            serde_json::from_reader(io::BufReader::new(d))?
        }

        FileFormat::JsonBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            serde_json::from_reader(io::BufReader::new(d))?
        }
    };

    route_from_value(value, options)
}

/// Parse a [Route] from a file at the provided path as per the provided [ReadOptions].
pub fn read_route_from_file<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Route, Error> {
    let f = File::open(path)?;
    read_route_from_io(f, options)
}

/// Parse a [Route] from a static buffer as per the provided [ReadOptions].
pub fn read_route_from_buffer(data: &[u8], options: &ReadOptions) -> Result<Route, Error> {
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        f => f,
    };

    if format == FileFormat::Json {
        // Fast path is available for in-memory JSON data
        let value: serde_json::Value = serde_json::from_slice(data)?;
        route_from_value(value, options)
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let options = ReadOptions {
            file_format: format,
            ..*options
        };
        read_route_from_io(io::Cursor::new(data), &options)
    }
}

fn route_from_value(value: serde_json::Value, options: &ReadOptions) -> Result<Route, Error> {
    if value.get("routes").is_none() && value.get("code").is_none() {
        return Ok(Route::deserialize(value)?);
    }

    let response = Response::deserialize(value)?;

    if let Some(code) = response.code {
        if !code.eq_ignore_ascii_case("ok") {
            return Err(Error::Api {
                code,
                message: response.message.unwrap_or_default(),
            });
        }
    }

    let available = response.routes.len();
    if available == 0 {
        return Err(Error::NoRoutes);
    }

    response
        .routes
        .into_iter()
        .nth(options.alternative)
        .ok_or(Error::NoSuchAlternative {
            requested: options.alternative,
            available,
        })
}
