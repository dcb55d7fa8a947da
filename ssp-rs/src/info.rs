//! Measurement info: channel descriptions, bad channels and attached projections.

use crate::proj::Projection;
use crate::{Error, Result};
use itertools::Itertools;

/// Sensor type of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Planar gradiometer.
    Grad,
    /// Magnetometer.
    Mag,
    /// MEG reference sensor.
    RefMeg,
    /// Scalp electrode.
    Eeg,
    /// Electro-oculogram.
    Eog,
    /// Electrocardiogram.
    Ecg,
    /// Trigger channel.
    Stim,
    /// Anything else.
    Misc,
}

impl ChannelKind {
    /// Whether the kind is a MEG data sensor (gradiometer or magnetometer).
    pub fn is_meg(self) -> bool {
        matches!(self, ChannelKind::Grad | ChannelKind::Mag)
    }
}

/// One channel of a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Unique channel name.
    pub name: String,
    /// Sensor type.
    pub kind: ChannelKind,
}

impl ChannelInfo {
    /// Describe a channel.
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Measurement info shared by raw recordings, epochs and evoked responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    sfreq: f64,
    chs: Vec<ChannelInfo>,
    /// Names of channels marked bad.
    pub bads: Vec<String>,
    /// Projection items attached to the data.
    pub projs: Vec<Projection>,
}

impl Info {
    /// Build an info with no bad channels and no projections.
    ///
    /// # Errors
    /// Non-positive sampling rate, empty channel list or duplicate names.
    pub fn new(chs: Vec<ChannelInfo>, sfreq: f64) -> Result<Self> {
        if !(sfreq.is_finite() && sfreq > 0.0) {
            return Err(Error::invalid_arg("sfreq", "sampling rate must be positive."));
        }
        if chs.is_empty() {
            return Err(Error::invalid_arg("chs", "at least one channel is required."));
        }
        if let Some(dup) = chs.iter().map(|c| c.name.as_str()).duplicates().next() {
            return Err(Error::invalid_arg(
                "chs",
                format!("channel name `{dup}` appears more than once."),
            ));
        }
        Ok(Self {
            sfreq,
            chs,
            bads: Vec::new(),
            projs: Vec::new(),
        })
    }

    /// Sampling rate in Hz.
    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    /// Channel descriptions in data order.
    pub fn chs(&self) -> &[ChannelInfo] {
        &self.chs
    }

    /// Number of channels.
    pub fn nchan(&self) -> usize {
        self.chs.len()
    }

    /// Channel names in data order.
    pub fn ch_names(&self) -> Vec<String> {
        self.chs.iter().map(|c| c.name.clone()).collect()
    }

    /// Index of the channel called `name`.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.chs.iter().position(|c| c.name == name)
    }

    /// Sensor type of channel `idx`.
    pub fn kind_of(&self, idx: usize) -> Option<ChannelKind> {
        self.chs.get(idx).map(|c| c.kind)
    }

    /// Whether channel `idx` is listed in [`Info::bads`].
    pub fn is_bad(&self, idx: usize) -> bool {
        self.chs
            .get(idx)
            .is_some_and(|c| self.bads.iter().any(|b| *b == c.name))
    }

    /// Sub-info holding only the channels at `picks`, in the given order.
    ///
    /// Bad channels survive only if they are picked; projections are kept.
    pub fn pick(&self, picks: &[usize]) -> Result<Info> {
        let chs = picks
            .iter()
            .map(|&i| {
                self.chs
                    .get(i)
                    .cloned()
                    .ok_or_else(|| Error::invalid_arg("picks", format!("channel index {i} out of range.")))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut info = Info::new(chs, self.sfreq)?;
        info.bads = self
            .bads
            .iter()
            .filter(|b| info.channel_index(b).is_some())
            .cloned()
            .collect();
        info.projs = self.projs.clone();
        Ok(info)
    }
}

/// MEG selection for [`pick_types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MegPick {
    /// No MEG channels.
    None,
    /// Gradiometers and magnetometers.
    All,
    /// Gradiometers only.
    Grad,
    /// Magnetometers only.
    Mag,
}

/// Channels left out by [`pick_types`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclude {
    /// Keep every matching channel.
    None,
    /// Drop the channels listed in [`Info::bads`].
    Bads,
    /// Drop the named channels.
    Names(Vec<String>),
}

/// Channel-type selection for [`pick_types`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOptions {
    /// MEG sensors to include.
    pub meg: MegPick,
    /// Include EEG.
    pub eeg: bool,
    /// Include EOG.
    pub eog: bool,
    /// Include ECG.
    pub ecg: bool,
    /// Include trigger channels.
    pub stim: bool,
    /// Include MEG reference sensors.
    pub ref_meg: bool,
    /// Channels to leave out.
    pub exclude: Exclude,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            meg: MegPick::All,
            eeg: false,
            eog: false,
            ecg: false,
            stim: false,
            ref_meg: false,
            exclude: Exclude::Bads,
        }
    }
}

impl PickOptions {
    /// Pick nothing but the given MEG selection, excluding bads.
    pub fn meg(meg: MegPick) -> Self {
        Self {
            meg,
            ..Self::default()
        }
    }

    /// Pick good EEG channels only.
    pub fn eeg() -> Self {
        Self {
            meg: MegPick::None,
            eeg: true,
            ..Self::default()
        }
    }

    fn accepts(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::Grad => matches!(self.meg, MegPick::All | MegPick::Grad),
            ChannelKind::Mag => matches!(self.meg, MegPick::All | MegPick::Mag),
            ChannelKind::RefMeg => self.ref_meg,
            ChannelKind::Eeg => self.eeg,
            ChannelKind::Eog => self.eog,
            ChannelKind::Ecg => self.ecg,
            ChannelKind::Stim => self.stim,
            ChannelKind::Misc => false,
        }
    }
}

/// Indices of the channels of `info` selected by `opts`, in channel order.
pub fn pick_types(info: &Info, opts: &PickOptions) -> Vec<usize> {
    info.chs
        .iter()
        .enumerate()
        .filter(|(_, ch)| opts.accepts(ch.kind))
        .filter(|(_, ch)| match &opts.exclude {
            Exclude::None => true,
            Exclude::Bads => !info.bads.contains(&ch.name),
            Exclude::Names(names) => !names.contains(&ch.name),
        })
        .map(|(i, _)| i)
        .collect()
}

/// Indices of `ch_names` entries that appear in `include`, in channel order.
pub fn pick_channels(ch_names: &[String], include: &[String]) -> Vec<usize> {
    ch_names
        .iter()
        .enumerate()
        .filter(|(_, name)| include.contains(name))
        .map(|(i, _)| i)
        .collect()
}
