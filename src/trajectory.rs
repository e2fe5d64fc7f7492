//! Extended-XYZ trajectory frames.
//!
//! One frame per snapshot:
//!
//! ```text
//! <n>
//! Time=<t>, Timestep=<step> Properties=type:I:1:id:I:1:pos:R:3
//! <type> <id> <x> <y> <z>     (n lines, vacancies (type 0) first, ids 0..n)
//! ```
//!
//! Floats are written with Rust's shortest round-trip formatting, so a frame
//! read back with [`read_frames`] reproduces positions and time bit-for-bit.

use crate::core::population::{Population, Species};
use crate::core::vec3::Vec3;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

const PROPERTIES: &str = "Properties=type:I:1:id:I:1:pos:R:3";

/// Borrowed view of the population at one instant.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Simulated time (fs).
    pub time: f64,
    /// Step index the frame was taken after; 0 for the initial frame.
    pub step: u64,
    /// Active defects.
    pub population: &'a Population,
}

/// One defect line of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEntry {
    /// Defect species.
    pub species: Species,
    /// Logical index within the frame.
    pub id: usize,
    /// Position (Å).
    pub position: Vec3,
}

/// Owned frame, as captured in memory or parsed back from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedFrame {
    /// Simulated time (fs).
    pub time: f64,
    /// Step index the frame was taken after.
    pub step: u64,
    /// Defect lines in logical order.
    pub entries: Vec<FrameEntry>,
}

impl OwnedFrame {
    /// Number of entries of `species`.
    pub fn count(&self, species: Species) -> usize {
        self.entries.iter().filter(|e| e.species == species).count()
    }
}

impl From<&Frame<'_>> for OwnedFrame {
    fn from(f: &Frame<'_>) -> Self {
        let entries = f
            .population
            .iter()
            .enumerate()
            .map(|(id, (species, position))| FrameEntry {
                species,
                id,
                position,
            })
            .collect();
        Self {
            time: f.time,
            step: f.step,
            entries,
        }
    }
}

/// Consumer of trajectory snapshots. Called synchronously between steps.
pub trait SnapshotSink {
    /// Record one frame.
    fn write_frame(&mut self, frame: &Frame<'_>) -> Result<()>;
}

impl<T: SnapshotSink + ?Sized> SnapshotSink for &mut T {
    fn write_frame(&mut self, frame: &Frame<'_>) -> Result<()> {
        (**self).write_frame(frame)
    }
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write_frame(&mut self, _frame: &Frame<'_>) -> Result<()> {
        Ok(())
    }
}

/// Keeps every frame in memory.
impl SnapshotSink for Vec<OwnedFrame> {
    fn write_frame(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.push(OwnedFrame::from(frame));
        Ok(())
    }
}

/// Writes frames in extended-XYZ format.
#[derive(Debug)]
pub struct XyzWriter<W: Write> {
    out: W,
    frames: u64,
}

impl XyzWriter<BufWriter<File>> {
    /// Create (truncate) a trajectory file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> XyzWriter<W> {
    /// Wrap `out`; nothing is written until the first frame.
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> SnapshotSink for XyzWriter<W> {
    fn write_frame(&mut self, frame: &Frame<'_>) -> Result<()> {
        let pop = frame.population;
        writeln!(self.out, "{}", pop.len())?;
        writeln!(
            self.out,
            "Time={}, Timestep={} {}",
            frame.time, frame.step, PROPERTIES
        )?;
        for (id, (species, r)) in pop.iter().enumerate() {
            writeln!(
                self.out,
                "{} {} {} {} {}",
                species.type_id(),
                id,
                r.x,
                r.y,
                r.z
            )?;
        }
        self.frames += 1;
        Ok(())
    }
}

/// Parse every frame of an extended-XYZ trajectory written by [`XyzWriter`].
///
/// Errors: `Error::Parse` with the 1-based line number on malformed input,
/// `Error::Io` on read failure.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<OwnedFrame>> {
    let mut frames = Vec::new();
    let mut lines = reader.lines().enumerate().map(|(k, l)| (k + 1, l));

    loop {
        let (line_no, count_line) = match lines.next() {
            Some((n, l)) => (n, l?),
            None => break,
        };
        let count_line = count_line.trim();
        if count_line.is_empty() {
            continue;
        }
        let n: usize = count_line.parse().map_err(|_| {
            let message = format!("expected particle count, got {count_line:?}");
            parse_err(line_no, message)
        })?;

        let (line_no, header) = next_line(&mut lines, line_no, "frame header")?;
        let (time, step) = parse_header(&header).ok_or_else(|| {
            parse_err(line_no, format!("malformed frame header {header:?}"))
        })?;

        let mut entries = Vec::with_capacity(n);
        let mut last = line_no;
        for _ in 0..n {
            let (line_no, text) = next_line(&mut lines, last, "defect line")?;
            last = line_no;
            let entry = parse_entry(&text).ok_or_else(|| {
                parse_err(line_no, format!("malformed defect line {text:?}"))
            })?;
            entries.push(entry);
        }
        frames.push(OwnedFrame {
            time,
            step,
            entries,
        });
    }
    Ok(frames)
}

/// Read a trajectory file from disk.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<OwnedFrame>> {
    let file = File::open(path)?;
    read_frames(std::io::BufReader::new(file))
}

fn next_line<I>(lines: &mut I, prev: usize, what: &str) -> Result<(usize, String)>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    match lines.next() {
        Some((n, l)) => Ok((n, l?)),
        None => {
            let message = format!("unexpected end of input, expected {what}");
            Err(parse_err(prev + 1, message))
        }
    }
}

fn parse_err(line: usize, message: String) -> Error {
    Error::Parse { line, message }
}

fn parse_header(header: &str) -> Option<(f64, u64)> {
    let rest = header.trim().strip_prefix("Time=")?;
    let (time, rest) = rest.split_once(',')?;
    let rest = rest.trim_start().strip_prefix("Timestep=")?;
    let step = rest.split_whitespace().next()?;
    Some((time.trim().parse().ok()?, step.parse().ok()?))
}

fn parse_entry(line: &str) -> Option<FrameEntry> {
    let mut it = line.split_whitespace();
    let species = Species::from_type_id(it.next()?.parse().ok()?)?;
    let id = it.next()?.parse().ok()?;
    let x = it.next()?.parse().ok()?;
    let y = it.next()?.parse().ok()?;
    let z = it.next()?.parse().ok()?;
    if it.next().is_some() {
        return None;
    }
    Some(FrameEntry {
        species,
        id,
        position: Vec3::new(x, y, z),
    })
}
