//! Write-only presentation sink. The core pushes HP changes out and never
//! reads anything back.

use log::info;

use crate::game::types::{EntityId, EntityKind};

pub trait PresentationSink {
    fn show_hp(&mut self, entity: EntityId, kind: EntityKind, hp: f32);
}

/// Default sink for headless peers: HP changes end up in the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl PresentationSink for LogSink {
    fn show_hp(&mut self, entity: EntityId, kind: EntityKind, hp: f32) {
        info!("[Hud] {} ({}) hp={:.1}", kind, entity, hp);
    }
}
