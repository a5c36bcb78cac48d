//! 帧缓冲绑定与附件追踪

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use truvis_capture::call::{ApiCall, Binding, ClearMask, classify};
use truvis_capture::event::{Event, is_null_resource};

/// 帧缓冲标识
///
/// 默认帧缓冲（窗口系统提供的）单独作为一个变体，而不是占用某个保留 ID。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FramebufferId {
    Default,
    Named(String),
}

impl FramebufferId {
    /// 空 ID 与 `0` 都解析为默认帧缓冲
    pub fn from_resource(id: Option<&str>) -> Self {
        match id {
            Some(id) if !is_null_resource(id) && id != "default" => Self::Named(id.to_string()),
            _ => Self::Default,
        }
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Display for FramebufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Named(id) => f.write_str(id),
        }
    }
}

impl From<FramebufferId> for String {
    fn from(id: FramebufferId) -> Self {
        id.to_string()
    }
}

impl From<String> for FramebufferId {
    fn from(id: String) -> Self {
        Self::from_resource(Some(&id))
    }
}

/// 帧缓冲的一个附件
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderTarget {
    /// 附件槽名，例如 `GL_COLOR_ATTACHMENT0`
    pub attachment: String,
    pub texture_id: String,
    pub mip_level: i64,
    pub layer: Option<i64>,
}

/// 一次清屏操作
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClearOp {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
    /// 清屏时生效的清除值
    pub clear_color: [f32; 4],
    pub clear_depth: f64,
    pub clear_stencil: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FramebufferDescriptor {
    pub id: FramebufferId,
    /// 通过 `glObjectLabel` 设置的名字
    pub name: Option<String>,
    pub is_default: bool,
    pub color_attachments: Vec<RenderTarget>,
    pub depth_attachment: Option<RenderTarget>,
    pub stencil_attachment: Option<RenderTarget>,
    pub depth_stencil_attachment: Option<RenderTarget>,
    pub draw_buffers: Vec<String>,
    pub clear_ops: Vec<ClearOp>,
}

impl FramebufferDescriptor {
    pub fn new(id: FramebufferId) -> Self {
        let is_default = id.is_default();
        Self {
            name: is_default.then(|| "Default Framebuffer".to_string()),
            id,
            is_default,
            color_attachments: Vec::new(),
            depth_attachment: None,
            stencil_attachment: None,
            depth_stencil_attachment: None,
            draw_buffers: Vec::new(),
            clear_ops: Vec::new(),
        }
    }

    /// 写入的纹理：所有颜色附件与深度附件
    pub fn output_textures(&self) -> impl Iterator<Item = &str> {
        self.color_attachments
            .iter()
            .chain(self.depth_attachment.iter())
            .map(|target| target.texture_id.as_str())
    }

    fn attach(&mut self, target: RenderTarget) {
        let slot = target.attachment.as_str();
        if slot.contains("COLOR") {
            match self.color_attachments.iter_mut().find(|existing| existing.attachment == slot) {
                Some(existing) => *existing = target,
                None => self.color_attachments.push(target),
            }
        } else if slot.contains("DEPTH_STENCIL") {
            self.depth_stencil_attachment = Some(target);
        } else if slot.contains("DEPTH") {
            self.depth_attachment = Some(target);
        } else if slot.contains("STENCIL") {
            self.stencil_attachment = Some(target);
        } else {
            log::trace!("unknown attachment slot {} on framebuffer {}", slot, self.id);
        }
    }

    fn detach(&mut self, slot: &str) {
        if slot.contains("COLOR") {
            self.color_attachments.retain(|existing| existing.attachment != slot);
        } else if slot.contains("DEPTH_STENCIL") {
            self.depth_stencil_attachment = None;
        } else if slot.contains("DEPTH") {
            self.depth_attachment = None;
        } else if slot.contains("STENCIL") {
            self.stencil_attachment = None;
        }
    }
}

/// 追踪当前绑定的帧缓冲，以及每个帧缓冲的附件、draw buffers 和清屏记录
#[derive(Debug)]
pub struct FramebufferTracker {
    framebuffers: IndexMap<FramebufferId, FramebufferDescriptor>,
    current: FramebufferId,

    clear_color: [f32; 4],
    clear_depth: f64,
    clear_stencil: i64,
}

impl Default for FramebufferTracker {
    fn default() -> Self {
        let mut framebuffers = IndexMap::new();
        framebuffers.insert(FramebufferId::Default, FramebufferDescriptor::new(FramebufferId::Default));

        Self {
            framebuffers,
            current: FramebufferId::Default,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

// new & init
impl FramebufferTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

// update
impl FramebufferTracker {
    pub fn process_event(&mut self, event: &Event) {
        self.apply(&classify(event));
    }

    pub fn apply(&mut self, call: &ApiCall) {
        match call {
            ApiCall::BindFramebuffer(binding) => {
                let id = FramebufferId::from_resource(binding.id());
                self.registered(&id);
                self.current = id;
            }
            ApiCall::AttachTexture {
                attachment,
                texture,
                level,
                layer,
            } => {
                let Some(slot) = attachment else {
                    log::trace!("attachment without slot on framebuffer {}", self.current);
                    return;
                };
                let Some(texture) = texture else {
                    log::trace!("attachment {} without texture attribute, keep framebuffer {}", slot, self.current);
                    return;
                };
                let framebuffer = self.current_mut();
                match texture {
                    Binding::Bind(texture) => framebuffer.attach(RenderTarget {
                        attachment: slot.to_string(),
                        texture_id: texture.to_string(),
                        mip_level: level.unwrap_or(0),
                        layer: *layer,
                    }),
                    Binding::Unbind => framebuffer.detach(slot),
                }
            }
            ApiCall::AttachRenderbuffer {
                attachment,
                renderbuffer,
            } => {
                let Some(slot) = attachment else {
                    log::trace!("renderbuffer attachment without slot on framebuffer {}", self.current);
                    return;
                };
                let Some(renderbuffer) = renderbuffer else {
                    log::trace!("attachment {} without renderbuffer attribute, keep framebuffer {}", slot, self.current);
                    return;
                };
                let framebuffer = self.current_mut();
                match renderbuffer {
                    Binding::Bind(renderbuffer) => framebuffer.attach(RenderTarget {
                        attachment: slot.to_string(),
                        texture_id: format!("RB_{renderbuffer}"),
                        mip_level: 0,
                        layer: None,
                    }),
                    Binding::Unbind => framebuffer.detach(slot),
                }
            }
            ApiCall::Clear(mask) => {
                if let Some(mask) = mask {
                    self.clear(*mask);
                }
            }
            ApiCall::ClearColor(color) => {
                if let Some(color) = color {
                    self.clear_color = *color;
                }
            }
            ApiCall::ClearDepth(depth) => {
                if let Some(depth) = depth {
                    self.clear_depth = *depth;
                }
            }
            ApiCall::ClearStencil(stencil) => {
                if let Some(stencil) = stencil {
                    self.clear_stencil = *stencil;
                }
            }
            ApiCall::DrawBuffers(buffers) => {
                if !buffers.is_empty() {
                    self.current_mut().draw_buffers = buffers.iter().map(|b| b.to_string()).collect();
                }
            }
            ApiCall::FramebufferLabel { framebuffer, label } => {
                let id = FramebufferId::from_resource(Some(*framebuffer));
                self.registered(&id).name = Some(label.to_string());
            }
            _ => {}
        }
    }

    fn clear(&mut self, mask: ClearMask) {
        let op = ClearOp {
            color: mask.color,
            depth: mask.depth,
            stencil: mask.stencil,
            clear_color: self.clear_color,
            clear_depth: self.clear_depth,
            clear_stencil: self.clear_stencil,
        };
        self.current_mut().clear_ops.push(op);
    }

    /// 取出描述，未见过的 ID 惰性注册
    fn registered(&mut self, id: &FramebufferId) -> &mut FramebufferDescriptor {
        self.framebuffers.entry(id.clone()).or_insert_with(|| FramebufferDescriptor::new(id.clone()))
    }

    fn current_mut(&mut self) -> &mut FramebufferDescriptor {
        let id = self.current.clone();
        self.registered(&id)
    }
}

// getter
impl FramebufferTracker {
    #[inline]
    pub fn current(&self) -> &FramebufferId {
        &self.current
    }

    #[inline]
    pub fn get(&self, id: &FramebufferId) -> Option<&FramebufferDescriptor> {
        self.framebuffers.get(id)
    }

    #[inline]
    pub fn all(&self) -> &IndexMap<FramebufferId, FramebufferDescriptor> {
        &self.framebuffers
    }

    pub fn into_framebuffers(self) -> IndexMap<FramebufferId, FramebufferDescriptor> {
        self.framebuffers
    }
}
