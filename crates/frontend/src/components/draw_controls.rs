use dioxus::prelude::*;
use otter_shared::panel::DrawMode;

/// The three draw-mode buttons and the pin toggle.
#[component]
pub fn DrawControls(
    active_mode: DrawMode,
    pin_label: &'static str,
    enabled: bool,
    on_draw: EventHandler<DrawMode>,
    on_toggle_pin: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "draw-controls",
            for mode in DrawMode::CONTROLS {
                button {
                    class: if active_mode == mode { "active" } else { "" },
                    disabled: !enabled,
                    onclick: move |_| on_draw.call(mode),
                    {mode.label()}
                }
            }
            button {
                class: "drop",
                disabled: !enabled,
                onclick: move |_| on_toggle_pin.call(()),
                "{pin_label}"
            }
        }
    }
}
