//! JSON-lines session container.
//!
//! One JSON object per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"stream","name":"/imu/data","messageType":"sensor_msgs/msg/Imu","serializationFormat":"json"}
//! {"kind":"message","stream":"/imu/data","logTime":1750838478817840000,"data":{"header":{...}}}
//! ```
//!
//! The payload of a message is the exact source text of its `data` value,
//! so a pass-through message is written back byte for byte.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use stampsync_engine::{
    Error, Message, MessageIter, Result, SessionSink, SessionSource, StreamMetadata,
};
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum LineKind {
    Stream,
    Message,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Line {
    kind: LineKind,
    name: Option<String>,
    #[serde(default)]
    message_type: String,
    #[serde(default)]
    serialization_format: String,
    stream: Option<String>,
    log_time: Option<i64>,
    #[serde(default, deserialize_with = "raw_payload")]
    data: Option<Box<RawValue>>,
}

// A plain Option would turn a `null` payload into a missing one.
fn raw_payload<'de, D>(deserializer: D) -> std::result::Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl Line {
    fn parse(number: usize, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Source(format!("line {number}: {e}")))
    }

    fn into_metadata(self, number: usize) -> Result<StreamMetadata> {
        let name = self
            .name
            .ok_or_else(|| Error::Source(format!("line {number}: stream without a name")))?;
        Ok(StreamMetadata::new(
            name,
            self.message_type,
            self.serialization_format,
        ))
    }

    fn into_message(self, number: usize) -> Result<Message> {
        let missing = |field: &str| Error::Source(format!("line {number}: message without {field}"));
        let stream = self.stream.ok_or_else(|| missing("stream"))?;
        let log_time = self.log_time.ok_or_else(|| missing("logTime"))?;
        let data = self.data.ok_or_else(|| missing("data"))?;
        Ok(Message::new(stream, data.get().as_bytes().to_vec(), log_time))
    }
}

/// A JSON-lines session on disk. Every pass re-opens the file.
#[derive(Debug, Clone)]
pub struct JsonlSession {
    path: PathBuf,
}

impl JsonlSession {
    /// Create a session over `path`. The file is not opened until a pass starts.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lines(&self) -> Result<impl Iterator<Item = Result<(usize, Line)>>> {
        let file = File::open(&self.path)
            .map_err(|e| Error::Source(format!("{}: {e}", self.path.display())))?;

        Ok(BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(|(i, text)| {
                let number = i + 1;
                match text {
                    Err(e) => Some(Err(Error::Source(format!("line {number}: {e}")))),
                    Ok(text) if text.trim().is_empty() => None,
                    Ok(text) => Some(Line::parse(number, &text).map(|line| (number, line))),
                }
            }))
    }
}

impl SessionSource for JsonlSession {
    /// Declared streams in order of first mention. A stream that only shows
    /// up in messages is declared without a type; a later declaration line
    /// fills the type in.
    fn streams(&self) -> Result<Vec<StreamMetadata>> {
        let mut streams: Vec<StreamMetadata> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut implicit: HashSet<String> = HashSet::new();

        for line in self.lines()? {
            let (number, line) = line?;
            match line.kind {
                LineKind::Stream => {
                    let metadata = line.into_metadata(number)?;
                    match index.get(&metadata.name) {
                        Some(&i) if implicit.remove(&metadata.name) => streams[i] = metadata,
                        Some(_) => {}
                        None => {
                            index.insert(metadata.name.clone(), streams.len());
                            streams.push(metadata);
                        }
                    }
                }
                LineKind::Message => {
                    let message = line.into_message(number)?;
                    if !index.contains_key(&message.stream) {
                        index.insert(message.stream.clone(), streams.len());
                        implicit.insert(message.stream.clone());
                        streams.push(StreamMetadata::untyped(message.stream));
                    }
                }
            }
        }
        Ok(streams)
    }

    fn messages(&self) -> Result<MessageIter<'_>> {
        let lines = self.lines()?;
        Ok(Box::new(lines.filter_map(|line| match line {
            Err(e) => Some(Err(e)),
            Ok((number, line)) => match line.kind {
                LineKind::Stream => None,
                LineKind::Message => Some(line.into_message(number)),
            },
        })))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamLine<'a> {
    kind: LineKind,
    name: &'a str,
    message_type: &'a str,
    serialization_format: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageLine<'a> {
    kind: LineKind,
    stream: &'a str,
    log_time: i64,
    data: &'a RawValue,
}

/// Writes a JSON-lines session.
pub struct JsonlWriter<W: Write> {
    out: BufWriter<W>,
    declared: HashSet<String>,
    written: usize,
}

impl JsonlWriter<File> {
    /// Create (or truncate) a session file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).map_err(|e| Error::Sink(format!("{}: {e}", path.display())))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonlWriter<W> {
    /// Wrap any writer.
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
            declared: HashSet::new(),
            written: 0,
        }
    }

    /// Messages written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn write_line<T: Serialize>(&mut self, line: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, line).map_err(|e| Error::Sink(e.to_string()))?;
        self.out
            .write_all(b"\n")
            .map_err(|e| Error::Sink(e.to_string()))
    }
}

impl<W: Write> SessionSink for JsonlWriter<W> {
    fn declare_stream(&mut self, metadata: &StreamMetadata) -> Result<()> {
        if !self.declared.insert(metadata.name.clone()) {
            return Ok(());
        }
        self.write_line(&StreamLine {
            kind: LineKind::Stream,
            name: &metadata.name,
            message_type: &metadata.message_type,
            serialization_format: &metadata.serialization_format,
        })
    }

    fn write(&mut self, stream: &str, data: &[u8], log_time: i64) -> Result<()> {
        if !self.declared.contains(stream) {
            return Err(Error::UndeclaredStream(stream.to_string()));
        }
        let text = std::str::from_utf8(data).map_err(|e| Error::encode(stream, e))?;
        let data: &RawValue = serde_json::from_str(text).map_err(|e| Error::encode(stream, e))?;

        self.write_line(&MessageLine {
            kind: LineKind::Message,
            stream,
            log_time,
            data,
        })?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| Error::Sink(e.to_string()))
    }
}
