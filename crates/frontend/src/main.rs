mod components;
mod coords;

use dioxus::prelude::*;

use components::map_panel::MapPanel;

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        div { class: "app",
            h1 { "Otter Map" }
            MapPanel {}
        }
    }
}

fn main() {
    launch(App);
}
