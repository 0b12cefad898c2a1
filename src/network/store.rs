//! Weight persistence.
//!
//! Every format carries the same payload: the three layer sizes, then all
//! input→hidden weights, then all hidden→output weights, each array in
//! row-major order.
//!
//! # Text
//! ```text
//! 2 3 2
//! w1[0] w1[1] ... w1[(in+1)*hid - 1]
//! w2[0] w2[1] ... w2[(hid+1)*out - 1]
//! ```
//!
//! # Script
//! ```text
//! var config = [2,3,2];
//! var w1 = [...];
//! var w2 = [...];
//! ```
//! Meant for pasting into a JavaScript page; never read back.
//!
//! # Binary
//! ```text
//! bytes  0-11:  in, hid, out       (native-endian i32)
//! bytes 12..:   w1 then w2         (native-endian f32)
//! ```
//! No magic number and no version field. Weights are narrowed to `f32`.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use tempfile::NamedTempFile;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;

const BINARY_HEADER_LEN: usize = 12;

/// On-disk encodings of a network's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightFormat {
    /// Space-separated decimals; loadable with [`Network::load`].
    Text,
    /// JavaScript array literals; write-only.
    Script,
    /// Compact `i32`/`f32` dump; loadable with [`Network::load_binary`].
    Binary,
    /// Pretty-printed JSON including the activation; loadable with [`Network::load_json`].
    Json,
}

impl WeightFormat {
    /// Guesses the format from a file extension, defaulting to `Text`.
    pub fn from_path(path: &Path) -> WeightFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js") => WeightFormat::Script,
            Some("bin") => WeightFormat::Binary,
            Some("json") => WeightFormat::Json,
            _ => WeightFormat::Text,
        }
    }
}

impl fmt::Display for WeightFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeightFormat::Text => "text",
            WeightFormat::Script => "script",
            WeightFormat::Binary => "binary",
            WeightFormat::Json => "json",
        })
    }
}

impl FromStr for WeightFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(WeightFormat::Text),
            "script" | "js" => Ok(WeightFormat::Script),
            "binary" | "bin" => Ok(WeightFormat::Binary),
            "json" => Ok(WeightFormat::Json),
            other => Err(Error::invalid(format!("unknown weight format '{other}'"))),
        }
    }
}

/// The persisted state of a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightStore {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    /// Only the JSON form records this; the other formats take it from the caller.
    #[serde(default)]
    pub activation: ActivationFunction,
    pub input_hidden: Vec<f64>,
    pub hidden_output: Vec<f64>,
}

impl WeightStore {
    pub fn spec(&self) -> NetworkSpec {
        NetworkSpec {
            input_size: self.input_size,
            hidden_size: self.hidden_size,
            output_size: self.output_size,
            activation: self.activation,
        }
    }

    pub fn write_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{} {} {}", self.input_size, self.hidden_size, self.output_size)?;
        write_joined(w, &self.input_hidden, " ", |w, v| write!(w, "{v}"))?;
        writeln!(w)?;
        write_joined(w, &self.hidden_output, " ", |w, v| write!(w, "{v}"))?;
        writeln!(w)
    }

    pub fn write_script<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(
            w,
            "var config = [{},{},{}];",
            self.input_size, self.hidden_size, self.output_size
        )?;
        for (name, values) in [("w1", &self.input_hidden), ("w2", &self.hidden_output)] {
            write!(w, "var {name} = [")?;
            write_joined(w, values, ",", |w, v| write!(w, "{v:.6}"))?;
            writeln!(w, "];")?;
        }
        Ok(())
    }

    pub fn write_binary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for size in [self.input_size, self.hidden_size, self.output_size] {
            let size = i32::try_from(size).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("layer size {size} exceeds i32"))
            })?;
            w.write_all(&size.to_ne_bytes())?;
        }
        for &v in self.input_hidden.iter().chain(&self.hidden_output) {
            w.write_all(&(v as f32).to_ne_bytes())?;
        }
        Ok(())
    }

    pub fn write_json<W: Write>(&self, w: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *w, self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(w)
    }

    /// Parses the text form. `origin` names the source in error messages.
    pub fn parse_text(text: &str, origin: &str) -> Result<WeightStore> {
        let mut tokens = text.split_whitespace();
        let mut size = |what: &str| -> Result<usize> {
            let token = tokens
                .next()
                .ok_or_else(|| Error::parse(origin, format!("missing {what}")))?;
            token
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| Error::parse(origin, format!("{what} must be a positive integer, got '{token}'")))
        };
        let input_size = size("input size")?;
        let hidden_size = size("hidden size")?;
        let output_size = size("output size")?;

        let (input_hidden_len, hidden_output_len) =
            weight_lens(NetworkSpec::new(input_size, hidden_size, output_size), origin)?;
        let input_hidden = parse_floats(&mut tokens, input_hidden_len, "input-hidden", origin)?;
        let hidden_output = parse_floats(&mut tokens, hidden_output_len, "hidden-output", origin)?;
        if let Some(extra) = tokens.next() {
            return Err(Error::parse(origin, format!("unexpected trailing value '{extra}'")));
        }

        Ok(WeightStore {
            input_size,
            hidden_size,
            output_size,
            activation: ActivationFunction::default(),
            input_hidden,
            hidden_output,
        })
    }

    /// Parses the binary form, widening every weight back to `f64`.
    pub fn parse_binary(bytes: &[u8], origin: &str) -> Result<WeightStore> {
        if bytes.len() < BINARY_HEADER_LEN {
            return Err(Error::parse(
                origin,
                format!("binary weights need a {BINARY_HEADER_LEN}-byte header, got {} bytes", bytes.len()),
            ));
        }
        let mut sizes = [0usize; 3];
        for (k, chunk) in bytes[..BINARY_HEADER_LEN].chunks_exact(4).enumerate() {
            let raw = i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            sizes[k] = usize::try_from(raw)
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| Error::parse(origin, format!("layer size must be positive, got {raw}")))?;
        }
        let [input_size, hidden_size, output_size] = sizes;
        let (input_hidden_len, hidden_output_len) =
            weight_lens(NetworkSpec::new(input_size, hidden_size, output_size), origin)?;

        let body = &bytes[BINARY_HEADER_LEN..];
        let expected = (input_hidden_len + hidden_output_len)
            .checked_mul(4)
            .ok_or_else(|| too_large(input_size, hidden_size, output_size, origin))?;
        if body.len() != expected {
            return Err(Error::parse(
                origin,
                format!("expected {expected} bytes of weights for {input_size}x{hidden_size}x{output_size}, got {}", body.len()),
            ));
        }
        let mut weights = body
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as f64);
        let input_hidden = weights.by_ref().take(input_hidden_len).collect();
        let hidden_output = weights.collect();

        Ok(WeightStore {
            input_size,
            hidden_size,
            output_size,
            activation: ActivationFunction::default(),
            input_hidden,
            hidden_output,
        })
    }
}

fn write_joined<W, F>(w: &mut W, values: &[f64], sep: &str, mut item: F) -> io::Result<()>
where
    W: Write,
    F: FnMut(&mut W, f64) -> io::Result<()>,
{
    for (i, &v) in values.iter().enumerate() {
        if i > 0 {
            w.write_all(sep.as_bytes())?;
        }
        item(w, v)?;
    }
    Ok(())
}

/// Weight array lengths for sizes read from `origin`, refusing any that overflow.
fn weight_lens(spec: NetworkSpec, origin: &str) -> Result<(usize, usize)> {
    spec.checked_lens()
        .ok_or_else(|| too_large(spec.input_size, spec.hidden_size, spec.output_size, origin))
}

fn too_large(input_size: usize, hidden_size: usize, output_size: usize, origin: &str) -> Error {
    Error::parse(
        origin,
        format!("layer sizes {input_size}x{hidden_size}x{output_size} are too large"),
    )
}

// `count` comes from the file header, so nothing is reserved up front.
fn parse_floats<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    count: usize,
    what: &str,
    origin: &str,
) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for index in 0..count {
        let token = tokens.next().ok_or_else(|| {
            Error::parse(origin, format!("{what} weights: expected {count} values, found {index}"))
        })?;
        let v = token.parse::<f64>().map_err(|_| {
            Error::parse(origin, format!("{what} weight #{index} is not a number: '{token}'"))
        })?;
        values.push(v);
    }
    Ok(values)
}

/// Writes through a temporary file in the destination directory and renames it
/// into place, so `path` either keeps its old content or gets the complete new one.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
{
    let fail = |source: io::Error| Error::Persistence { path: path.to_path_buf(), source };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(fail)?;
        writer.flush().map_err(fail)?;
    }
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    let construction = |source: io::Error| Error::Construction { path: path.to_path_buf(), source };
    let file = File::open(path).map_err(construction)?;
    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes).map_err(construction)?;
    Ok(bytes)
}

impl Network {
    /// Snapshot of the sizes, activation and weights.
    pub fn to_store(&self) -> WeightStore {
        WeightStore {
            input_size: self.spec.input_size,
            hidden_size: self.spec.hidden_size,
            output_size: self.spec.output_size,
            activation: self.spec.activation,
            input_hidden: self.input_hidden.as_slice().to_vec(),
            hidden_output: self.hidden_output.as_slice().to_vec(),
        }
    }

    pub fn from_store(store: WeightStore) -> Result<Network> {
        let spec = store.spec();
        Network::from_weights(spec, store.input_hidden, store.hidden_output)
    }

    /// Saves the weights in `format`. The write is all-or-nothing.
    pub fn save(&self, path: impl AsRef<Path>, format: WeightFormat) -> Result<()> {
        let path = path.as_ref();
        let store = self.to_store();
        write_atomically(path, |w| match format {
            WeightFormat::Text => store.write_text(w),
            WeightFormat::Script => store.write_script(w),
            WeightFormat::Binary => store.write_binary(w),
            WeightFormat::Json => store.write_json(w),
        })?;
        tracing::debug!("saved {} weights to {}", format, path.display());
        Ok(())
    }

    /// Rebuilds a network from the text form. Layer sizes come from the file.
    pub fn load(path: impl AsRef<Path>, activation: ActivationFunction) -> Result<Network> {
        let path = path.as_ref();
        let bytes = read_source(path)?;
        let origin = path.display().to_string();
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| Error::parse(&origin, "weight file is not valid UTF-8"))?;
        let mut store = WeightStore::parse_text(text, &origin)?;
        store.activation = activation;
        tracing::debug!(
            "loaded {}x{}x{} network from {}",
            store.input_size, store.hidden_size, store.output_size, origin
        );
        Network::from_store(store)
    }

    /// Rebuilds a network from the binary form. Weights come back at `f32` precision.
    pub fn load_binary(path: impl AsRef<Path>, activation: ActivationFunction) -> Result<Network> {
        let path = path.as_ref();
        let bytes = read_source(path)?;
        let mut store = WeightStore::parse_binary(&bytes, &path.display().to_string())?;
        store.activation = activation;
        Network::from_store(store)
    }

    /// Rebuilds a network, activation included, from the JSON form.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network> {
        let bytes = read_source(path.as_ref())?;
        let store: WeightStore = serde_json::from_slice(&bytes)?;
        Network::from_store(store)
    }
}
