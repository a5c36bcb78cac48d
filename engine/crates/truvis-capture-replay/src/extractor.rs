//! 单遍事件回放
//!
//! 按顺序把每个事件分类一次，交给三个 tracker 更新状态；
//! 遇到 draw / dispatch 时立即拍下当前状态，生成 `DrawCallRecord`。

use indexmap::IndexMap;
use truvis_capture::call::{ApiCall, Binding, DrawCall, DrawKind, classify};
use truvis_capture::event::Event;

use crate::config::ReplayConfig;
use crate::draw_call::DrawCallRecord;
use crate::framebuffer_tracker::{FramebufferDescriptor, FramebufferId, FramebufferTracker};
use crate::resource_inventory::{ResourceInventory, ShaderInfo, TextureInfo};
use crate::sampler_tracker::{SamplerDescriptor, SamplerTracker};
use crate::state_tracker::StateTracker;

/// 回放结果
pub struct Extraction {
    pub draws: Vec<DrawCallRecord>,
    pub framebuffers: IndexMap<FramebufferId, FramebufferDescriptor>,
    pub samplers: Vec<SamplerDescriptor>,
    pub textures: Vec<TextureInfo>,
    pub shaders: Vec<ShaderInfo>,
}

/// 一次分析独占的回放器，每次分析都重新创建
pub struct DrawCallExtractor {
    state: StateTracker,
    samplers: SamplerTracker,
    framebuffers: FramebufferTracker,
    inventory: ResourceInventory,

    program: Option<String>,
    /// 当前打开的调试分组，栈顶为最内层
    debug_groups: Vec<String>,
    inherit_debug_group_markers: bool,

    draws: Vec<DrawCallRecord>,
}

// new & init
impl DrawCallExtractor {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            state: StateTracker::new(),
            samplers: SamplerTracker::new(),
            framebuffers: FramebufferTracker::new(),
            inventory: ResourceInventory::new(),
            program: None,
            debug_groups: Vec::new(),
            inherit_debug_group_markers: config.inherit_debug_group_markers,
            draws: Vec::new(),
        }
    }
}

// process
impl DrawCallExtractor {
    /// 回放整个事件序列
    pub fn extract(mut self, events: &[Event]) -> Extraction {
        for event in events {
            self.process_event(event);
        }

        log::debug!(
            "replayed {} events: {} draws, {} framebuffers",
            events.len(),
            self.draws.len(),
            self.framebuffers.all().len()
        );

        let (textures, shaders) = self.inventory.into_parts();
        Extraction {
            draws: self.draws,
            framebuffers: self.framebuffers.into_framebuffers(),
            samplers: self.samplers.into_samplers(),
            textures,
            shaders,
        }
    }

    pub fn process_event(&mut self, event: &Event) {
        let call = classify(event);

        match &call {
            ApiCall::UseProgram(Some(Binding::Bind(program))) => self.program = Some(program.to_string()),
            ApiCall::UseProgram(Some(Binding::Unbind)) => self.program = None,
            ApiCall::PushDebugGroup(message) => {
                self.debug_groups.push(message.unwrap_or_default().to_string());
            }
            ApiCall::PopDebugGroup => {
                self.debug_groups.pop();
            }
            ApiCall::Draw(draw) => {
                self.record_draw(event, draw);
                return;
            }
            _ => {}
        }

        self.state.apply(&call);
        self.samplers.apply(&call);
        self.framebuffers.apply(&call);
        self.inventory.apply(&call, self.samplers.bound_texture(self.samplers.active_unit()));
    }

    fn record_draw(&mut self, event: &Event, draw: &DrawCall) {
        let (vertex_count, index_count) = match draw.kind {
            DrawKind::Indexed => (0, draw.count),
            DrawKind::Arrays | DrawKind::Dispatch => (draw.count, 0),
        };

        let marker = draw.marker.map(str::to_string).or_else(|| {
            if self.inherit_debug_group_markers {
                self.debug_groups.iter().rev().find(|group| !group.is_empty()).cloned()
            } else {
                None
            }
        });

        self.draws.push(DrawCallRecord {
            ordinal: self.draws.len() + 1,
            event_id: event.event_id,
            name: event.name.clone(),
            kind: draw.kind.into(),
            duration_ns: event.duration_ns,
            vertex_count,
            index_count,
            instance_count: draw.instance_count.unwrap_or(1).max(1),
            marker,
            state: self.state.snapshot(),
            bound_textures: self.samplers.bound_textures(),
            program: self.program.clone(),
            framebuffer: self.framebuffers.current().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::draw_call::DrawCallKind;

    use super::*;

    fn extract(events: &[Event]) -> Extraction {
        DrawCallExtractor::new(&ReplayConfig::default()).extract(events)
    }

    #[test]
    fn test_draw_snapshots_current_state() {
        let events = [
            Event::new(1, "glBindFramebuffer").with_resource("framebuffer", "ResourceId::5"),
            Event::new(2, "glUseProgram").with_resource("program", "ResourceId::30"),
            Event::new(3, "glActiveTexture").with_enum("texture", "GL_TEXTURE1"),
            Event::new(4, "glBindTexture").with_resource("texture", "ResourceId::41"),
            Event::new(5, "glActiveTexture").with_enum("texture", "GL_TEXTURE0"),
            Event::new(6, "glBindTexture").with_resource("texture", "ResourceId::40"),
            Event::new(7, "glEnable").with_enum("cap", "GL_DEPTH_TEST"),
            Event::new(8, "glDrawElements").with_int("count", 300).with_string("Label", "Opaque").with_duration(4000),
            Event::new(9, "glDisable").with_enum("cap", "GL_DEPTH_TEST"),
            Event::new(10, "glUseProgram").with_resource("program", "ResourceId::0"),
            Event::new(11, "glDrawArrays").with_int("count", 3),
        ];

        let extraction = extract(&events);
        let draws = &extraction.draws;
        assert_eq!(draws.len(), 2);

        let first = &draws[0];
        assert_eq!(first.ordinal, 1);
        assert_eq!(first.event_id, 8);
        assert_eq!(first.kind, DrawCallKind::DrawIndexed);
        assert_eq!(first.index_count, 300);
        assert_eq!(first.vertex_count, 0);
        assert_eq!(first.instance_count, 1);
        assert_eq!(first.marker.as_deref(), Some("Opaque"));
        assert_eq!(first.duration_ns, Some(4000));
        assert!(first.state.depth.test_enabled);
        assert_eq!(first.bound_textures, vec!["ResourceId::40", "ResourceId::41"]);
        assert_eq!(first.program.as_deref(), Some("ResourceId::30"));
        assert_eq!(first.framebuffer, FramebufferId::Named("ResourceId::5".to_string()));

        let second = &draws[1];
        assert_eq!(second.ordinal, 2);
        assert_eq!(second.vertex_count, 3);
        assert!(!second.state.depth.test_enabled);
        assert_eq!(second.program, None);
        assert_eq!(second.marker, None);
    }

    #[test]
    fn test_missing_count_still_recorded() {
        let extraction = extract(&[Event::new(1, "glDrawArrays"), Event::new(2, "glDrawElements")]);

        assert_eq!(extraction.draws.len(), 2);
        assert_eq!(extraction.draws[0].vertex_count, 0);
        assert_eq!(extraction.draws[1].index_count, 0);
    }

    #[test]
    fn test_negative_count_and_instance_clamp() {
        let extraction = extract(&[Event::new(1, "glDrawArraysInstanced")
            .with_int("count", -6)
            .with_int("instancecount", 0)]);

        let draw = &extraction.draws[0];
        assert_eq!(draw.vertex_count, -6);
        assert_eq!(draw.instance_count, 1);
    }

    #[test]
    fn test_debug_group_inheritance() {
        let events = [
            Event::new(1, "glPushDebugGroup").with_string("message", "Shadows"),
            Event::new(2, "glDrawArrays").with_int("count", 3),
            Event::new(3, "glPopDebugGroup"),
            Event::new(4, "glDrawArrays").with_int("count", 3),
        ];

        let plain = extract(&events);
        assert_eq!(plain.draws[0].marker, None);

        let config = ReplayConfig {
            inherit_debug_group_markers: true,
            ..Default::default()
        };
        let inherited = DrawCallExtractor::new(&config).extract(&events);
        assert_eq!(inherited.draws[0].marker.as_deref(), Some("Shadows"));
        assert_eq!(inherited.draws[1].marker, None);
    }

    #[test]
    fn test_draw_does_not_mutate_trackers() {
        let events = [
            Event::new(1, "glDrawArrays")
                .with_int("count", 3)
                .with_resource("framebuffer", "ResourceId::9")
                .with_enum("cap", "GL_BLEND"),
            Event::new(2, "glDrawArrays").with_int("count", 3),
        ];

        let extraction = extract(&events);
        assert_eq!(extraction.draws[0].state, extraction.draws[1].state);
        assert_eq!(extraction.draws[1].framebuffer, FramebufferId::Default);
        assert_eq!(extraction.framebuffers.len(), 1);
    }

    #[test]
    fn test_texture_allocation_follows_active_unit() {
        let events = [
            Event::new(1, "glActiveTexture").with_enum("texture", "GL_TEXTURE2"),
            Event::new(2, "glBindTexture").with_resource("texture", "ResourceId::80"),
            Event::new(3, "glTexStorage2D")
                .with_int("levels", 4)
                .with_enum("internalformat", "GL_RGBA8")
                .with_int("width", 128)
                .with_int("height", 128),
            Event::new(4, "glCreateShader")
                .with_resource("Shader", "ResourceId::90")
                .with_enum("type", "GL_FRAGMENT_SHADER"),
            Event::new(5, "glDrawArrays").with_int("count", 3),
        ];

        let extraction = extract(&events);
        assert_eq!(extraction.textures.len(), 1);
        let texture = &extraction.textures[0];
        assert_eq!(texture.id, "ResourceId::80");
        assert_eq!((texture.width, texture.height, texture.mip_levels), (128, 128, 4));
        assert_eq!(texture.format.as_deref(), Some("GL_RGBA8"));

        assert_eq!(extraction.shaders.len(), 1);
        assert_eq!(extraction.shaders[0].name, "Shader_ResourceId::90");
        assert_eq!(extraction.draws[0].bound_textures, vec!["ResourceId::80"]);
    }
}
