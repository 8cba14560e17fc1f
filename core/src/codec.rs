//! Snapshot binary codec.
//!
//! Layout (little-endian, no padding):
//!
//!   u8   format version
//!   u8   valid | u8 complete | u8 use_tutorial
//!   f32  elapsed_time
//!   i32  score | wrong_answers | losses | recent_losses | current_area_index
//!   u8   selected_power
//!   u16  len + u8 * len    power_list
//!   u16  len + u8 * len    challengers_defeated
//!   u16  len + u8 * len    tutorial_progress.cleared
//!
//! RULE: decode never fills a gap with a default. Any mismatch in length,
//! code, or trailing data is a DecodeError.

use crate::{
    error::{DecodeError, EncodeError},
    snapshot::{Snapshot, TutorialProgress},
    types::{PowerKind, CHALLENGER_COUNT, POWER_KIND_COUNT, TUTORIAL_STEP_COUNT},
};

pub const FORMAT_VERSION: u8 = 1;

/// Exact size of an encoded snapshot.
pub const ENCODED_LEN: usize = 1
    + 3
    + 4
    + 4 * 5
    + 1
    + (2 + POWER_KIND_COUNT)
    + (2 + CHALLENGER_COUNT)
    + (2 + TUTORIAL_STEP_COUNT);

pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, EncodeError> {
    check_encodable(snapshot)?;

    let mut out = Vec::with_capacity(ENCODED_LEN);
    out.push(FORMAT_VERSION);
    out.push(snapshot.valid as u8);
    out.push(snapshot.complete as u8);
    out.push(snapshot.use_tutorial as u8);
    out.extend_from_slice(&snapshot.elapsed_time.to_le_bytes());
    for value in [
        snapshot.score,
        snapshot.wrong_answers,
        snapshot.losses,
        snapshot.recent_losses,
        snapshot.current_area_index,
    ] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.push(snapshot.selected_power.code());

    write_len(&mut out, "power_list", snapshot.power_list.len())?;
    out.extend(snapshot.power_list.iter().map(|p| p.code()));

    write_len(&mut out, "challengers_defeated", snapshot.challengers_defeated.len())?;
    out.extend(snapshot.challengers_defeated.iter().map(|d| *d as u8));

    let cleared = &snapshot.tutorial_progress.cleared;
    write_len(&mut out, "tutorial_progress", cleared.len())?;
    out.extend(cleared.iter().map(|c| *c as u8));

    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<Snapshot, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut r = Reader::new(bytes);

    let version = r.u8()?;
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedFormat(version));
    }

    let valid        = r.bool("valid")?;
    let complete     = r.bool("complete")?;
    let use_tutorial = r.bool("use_tutorial")?;

    let elapsed_time = r.f32()?;
    if !elapsed_time.is_finite() || elapsed_time < 0.0 {
        return Err(DecodeError::InvalidFloat { field: "elapsed_time" });
    }

    let score              = r.i32()?;
    let wrong_answers      = r.count("wrong_answers")?;
    let losses             = r.count("losses")?;
    let recent_losses      = r.count("recent_losses")?;
    let current_area_index = r.i32()?;

    let selected_power = r.power("selected_power")?;

    r.expect_len("power_list", POWER_KIND_COUNT)?;
    let mut power_list = [PowerKind::None; POWER_KIND_COUNT];
    for slot in power_list.iter_mut() {
        *slot = r.power("power_list")?;
    }

    r.expect_len("challengers_defeated", CHALLENGER_COUNT)?;
    let mut challengers_defeated = [false; CHALLENGER_COUNT];
    for slot in challengers_defeated.iter_mut() {
        *slot = r.bool("challengers_defeated")?;
    }

    r.expect_len("tutorial_progress", TUTORIAL_STEP_COUNT)?;
    let mut cleared = [false; TUTORIAL_STEP_COUNT];
    for slot in cleared.iter_mut() {
        *slot = r.bool("tutorial_progress")?;
    }

    if r.remaining() > 0 {
        return Err(DecodeError::TrailingBytes(r.remaining()));
    }

    Ok(Snapshot {
        valid,
        complete,
        use_tutorial,
        elapsed_time,
        score,
        wrong_answers,
        losses,
        recent_losses,
        current_area_index,
        selected_power,
        power_list,
        challengers_defeated,
        tutorial_progress: TutorialProgress { cleared },
    })
}

fn check_encodable(snapshot: &Snapshot) -> Result<(), EncodeError> {
    if !snapshot.elapsed_time.is_finite() || snapshot.elapsed_time < 0.0 {
        return Err(EncodeError::Unrepresentable {
            field:  "elapsed_time",
            reason: format!("{} is not a finite non-negative number", snapshot.elapsed_time),
        });
    }
    for (field, value) in [
        ("wrong_answers", snapshot.wrong_answers),
        ("losses", snapshot.losses),
        ("recent_losses", snapshot.recent_losses),
    ] {
        if value < 0 {
            return Err(EncodeError::Unrepresentable {
                field,
                reason: format!("negative count {value}"),
            });
        }
    }
    Ok(())
}

fn write_len(out: &mut Vec<u8>, field: &'static str, len: usize) -> Result<(), EncodeError> {
    let len = u16::try_from(len).map_err(|_| EncodeError::Unrepresentable {
        field,
        reason: format!("{len} entries exceed the u16 length prefix"),
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Cursor over an encoded payload. Every read is bounds-checked.
struct Reader<'a> {
    bytes: &'a [u8],
    pos:   usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        if self.remaining() < N {
            return Err(DecodeError::Truncated {
                needed:    N - self.remaining(),
                remaining: self.remaining(),
            });
        }
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        Ok(buf)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    fn bool(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidBool { field, value }),
        }
    }

    fn count(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        let value = self.i32()?;
        if value < 0 {
            return Err(DecodeError::Negative { field, value });
        }
        Ok(value)
    }

    fn power(&mut self, field: &'static str) -> Result<PowerKind, DecodeError> {
        let value = self.u8()?;
        PowerKind::from_code(value).ok_or(DecodeError::InvalidEnum { field, value })
    }

    fn expect_len(&mut self, field: &'static str, expected: usize) -> Result<(), DecodeError> {
        let actual = self.u16()? as usize;
        if actual != expected {
            return Err(DecodeError::LengthMismatch { field, expected, actual });
        }
        Ok(())
    }
}
