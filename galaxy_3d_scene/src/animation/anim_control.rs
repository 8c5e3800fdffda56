/// AnimControl - plays animations on a skeleton through channels.
///
/// Each channel plays one animation at a time and can crossfade from the
/// previous one. Every frame the skeleton is reset to its bind pose, each
/// channel blends its animation in, then model poses are recomputed.
/// Listeners hear about animation changes and completed cycles.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::animation::{AnimContext, Animation};
use crate::{engine_bail, engine_debug};
use crate::error::Result;

/// What happens when a channel reaches the end of its animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Restart from the beginning
    #[default]
    Loop,
    /// Stop on the last frame
    DontLoop,
    /// Play backwards, then forwards again
    Cycle,
}

/// Bring `time` back into `[0, max]` according to `mode`.
///
/// For `Cycle` a negative result means the channel now plays backwards;
/// its magnitude is the time to continue from.
pub fn clamp_wrap_time(time: f32, max: f32, mode: LoopMode) -> f32 {
    if time == 0.0 || max <= 0.0 {
        return 0.0;
    }
    match mode {
        LoopMode::Cycle => {
            let odd = ((time / max) as i32) % 2 != 0;
            if time < 0.0 {
                if odd { time % max } else { -(max + (time % max)) }
            } else if odd {
                -(max - (time % max))
            } else {
                time % max
            }
        }
        LoopMode::DontLoop => time.clamp(0.0, max),
        LoopMode::Loop => time % max,
    }
}

// ============================================================================
// AnimChannel
// ============================================================================

#[derive(Debug, Clone)]
pub struct AnimChannel {
    animation: Option<Arc<Animation>>,
    time: f32,
    speed: f32,
    loop_mode: LoopMode,

    blend_from: Option<Arc<Animation>>,
    time_blend_from: f32,
    speed_blend_from: f32,
    loop_mode_blend_from: LoopMode,
    /// Weight of the current animation, 1 once a crossfade completes
    blend_amount: f32,
    blend_rate: f32,
}

impl Default for AnimChannel {
    fn default() -> Self {
        Self {
            animation: None,
            time: 0.0,
            speed: 1.0,
            loop_mode: LoopMode::Loop,
            blend_from: None,
            time_blend_from: 0.0,
            speed_blend_from: 1.0,
            loop_mode_blend_from: LoopMode::Loop,
            blend_amount: 1.0,
            blend_rate: 0.0,
        }
    }
}

impl AnimChannel {
    pub fn animation_name(&self) -> Option<&str> {
        self.animation.as_deref().map(Animation::name)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        let length = self.animation_length();
        self.time = time.clamp(0.0, length);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    pub fn animation_length(&self) -> f32 {
        self.animation.as_ref().map_or(0.0, |a| a.length())
    }

    /// True while a crossfade from the previous animation is running
    pub fn is_blending(&self) -> bool {
        self.blend_from.is_some()
    }

    /// Start `animation` from time 0, fading out the current one over
    /// `blend_time` seconds (0 switches immediately).
    pub fn play(&mut self, animation: Arc<Animation>, blend_time: f32) {
        match self.animation.take() {
            Some(previous) if blend_time > 0.0 => {
                self.blend_from = Some(previous);
                self.time_blend_from = self.time;
                self.speed_blend_from = self.speed;
                self.loop_mode_blend_from = self.loop_mode;
                self.blend_amount = 0.0;
                self.blend_rate = 1.0 / blend_time;
            }
            _ => {
                self.blend_from = None;
                self.blend_amount = 1.0;
            }
        }

        self.animation = Some(animation);
        self.time = 0.0;
        self.speed = 1.0;
        self.loop_mode = LoopMode::Loop;
    }

    /// Advance by `tpf` seconds, blending the animation(s) into `ctx`.
    ///
    /// Returns true when the animation completed a cycle: it wrapped
    /// (`Loop`), turned around (`Cycle`) or reached its end (`DontLoop`,
    /// reported once).
    pub fn update(&mut self, tpf: f32, ctx: &mut AnimContext<'_>) -> bool {
        let Some(animation) = self.animation.clone() else {
            return false;
        };

        if let Some(from) = self.blend_from.clone() {
            from.set_time(self.time_blend_from, 1.0 - self.blend_amount, ctx);
            self.time_blend_from = clamp_wrap_time(
                self.time_blend_from + tpf * self.speed_blend_from,
                from.length(),
                self.loop_mode_blend_from,
            );
            if self.time_blend_from < 0.0 {
                self.time_blend_from = -self.time_blend_from;
                self.speed_blend_from = -self.speed_blend_from;
            }

            self.blend_amount += tpf * self.blend_rate;
            if self.blend_amount >= 1.0 {
                self.blend_amount = 1.0;
                self.blend_from = None;
            }
        }

        animation.set_time(self.time, self.blend_amount, ctx);

        let length = animation.length();
        let advanced = self.time + tpf * self.speed;
        let wrapped = clamp_wrap_time(advanced, length, self.loop_mode);
        let left_range = length > 0.0 && (advanced >= length || advanced < 0.0);
        let cycle_done = match self.loop_mode {
            // Silent while resting on the end
            LoopMode::DontLoop => left_range && wrapped != self.time,
            LoopMode::Loop | LoopMode::Cycle => left_range,
        };

        self.time = wrapped;
        if self.time < 0.0 {
            self.time = -self.time;
            self.speed = -self.speed;
        }
        cycle_done
    }
}

// ============================================================================
// AnimEventListener
// ============================================================================

/// Notified of what the channels of an `AnimControl` play.
pub trait AnimEventListener: Send {
    /// Channel `channel` finished a cycle of `name`
    fn on_anim_cycle_done(&mut self, channel: usize, name: &str);

    /// Channel `channel` started playing `name`
    fn on_anim_change(&mut self, channel: usize, name: &str);
}

// ============================================================================
// AnimControl
// ============================================================================

#[derive(Default)]
pub struct AnimControl {
    animations: FxHashMap<String, Arc<Animation>>,
    channels: Vec<AnimChannel>,
    listeners: Vec<Box<dyn AnimEventListener>>,
}

impl std::fmt::Debug for AnimControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimControl")
            .field("animations", &self.animations.len())
            .field("channels", &self.channels)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AnimControl {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== ANIMATIONS =====

    /// Register an animation, replacing one with the same name
    pub fn add_animation(&mut self, animation: Animation) {
        self.animations.insert(animation.name().to_string(), Arc::new(animation));
    }

    pub fn remove_animation(&mut self, name: &str) -> bool {
        self.animations.remove(name).is_some()
    }

    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name).map(Arc::as_ref)
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn animation_length(&self, name: &str) -> Result<f32> {
        match self.animations.get(name) {
            Some(animation) => Ok(animation.length()),
            None => engine_bail!("galaxy3d::AnimControl", InvalidResource =>
                "Animation '{}' does not exist", name),
        }
    }

    // ===== CHANNELS =====

    /// Add a channel and return its index
    pub fn create_channel(&mut self) -> usize {
        self.channels.push(AnimChannel::default());
        self.channels.len() - 1
    }

    pub fn channel(&self, index: usize) -> Option<&AnimChannel> {
        self.channels.get(index)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut AnimChannel> {
        self.channels.get_mut(index)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn clear_channels(&mut self) {
        self.channels.clear();
    }

    // ===== LISTENERS =====

    pub fn add_listener(&mut self, listener: Box<dyn AnimEventListener>) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn num_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Play animation `name` on channel `channel`, crossfading over `blend_time`.
    pub fn set_anim(&mut self, channel: usize, name: &str, blend_time: f32) -> Result<()> {
        let Some(animation) = self.animations.get(name).cloned() else {
            engine_bail!("galaxy3d::AnimControl", InvalidResource =>
                "Animation '{}' does not exist", name);
        };
        let Some(target) = self.channels.get_mut(channel) else {
            engine_bail!("galaxy3d::AnimControl", InvalidResource =>
                "Channel {} does not exist ({} channels)", channel, self.channels.len());
        };
        target.play(animation, blend_time);
        engine_debug!("galaxy3d::AnimControl", "Channel {} plays '{}'", channel, name);
        for listener in &mut self.listeners {
            listener.on_anim_change(channel, name);
        }
        Ok(())
    }

    /// Reset the skeleton, blend every channel in, then update model poses.
    ///
    /// Listeners are told about completed cycles once every channel ran.
    pub fn update(&mut self, tpf: f32, ctx: &mut AnimContext<'_>) {
        ctx.skeleton.reset();
        let mut completed = Vec::new();
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if channel.update(tpf, ctx) {
                if let Some(name) = channel.animation_name() {
                    completed.push((index, name.to_string()));
                }
            }
        }
        ctx.skeleton.update();

        for (index, name) in &completed {
            for listener in &mut self.listeners {
                listener.on_anim_cycle_done(*index, name);
            }
        }
    }
}

#[cfg(test)]
#[path = "anim_control_tests.rs"]
mod tests;
