use mapcraft::{EditorConfig, History, Intent, Interaction, MapState, PointerEvent, Tool, ToolContext, Viewport};
use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;
mod logger;

pub use api::{arrow_offset, bounds_res, centroid, control_points, init_logging, set_panic_hook};

#[wasm_bindgen]
pub struct Editor {
    pub(crate) history: History,
    pub(crate) interaction: Interaction,
    pub(crate) config: EditorConfig,
    pub(crate) viewport: Viewport,
    pub(crate) tool: Tool,
}

impl Editor {
    pub fn rs_new() -> Editor {
        let config = EditorConfig::default();
        Editor {
            history: History::new(MapState::new(), config.history_limit),
            interaction: Interaction::new(Tool::Select),
            config,
            viewport: Viewport::default(),
            tool: Tool::Select,
        }
    }

    pub fn state(&self) -> &MapState { self.history.present() }

    /// Run one pointer event through the active tool and commit what it emits as one undo step.
    pub(crate) fn rs_pointer(&mut self, ev: PointerEvent) -> Vec<Intent> {
        let ctx = ToolContext { state: self.history.present(), config: &self.config, viewport: self.viewport, tool: self.tool };
        let (next, intents) = self.interaction.handle(&ctx, ev);
        self.interaction = next;
        if !intents.is_empty() {
            log::debug!("{:?} tool emitted {} intent(s)", self.tool, intents.len());
            self.history.dispatch(&intents);
        }
        intents
    }
}
