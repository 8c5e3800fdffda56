/// Animation - a named set of tracks sharing one timeline.

use crate::animation::{AnimContext, Track};

pub struct Animation {
    name: String,
    length: f32,
    tracks: Vec<Box<dyn Track>>,
}

impl Animation {
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            length: length.max(0.0),
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: Box<dyn Track>) -> Self {
        self.add_track(track);
        self
    }

    pub fn add_track(&mut self, track: Box<dyn Track>) {
        self.tracks.push(track);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in seconds
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Apply every track at `time` with `weight`
    pub fn set_time(&self, time: f32, weight: f32, ctx: &mut AnimContext<'_>) {
        for track in &self.tracks {
            track.set_time(time, weight, ctx);
        }
    }
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.name)
            .field("length", &self.length)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}
