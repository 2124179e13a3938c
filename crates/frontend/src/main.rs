mod api;
mod components;
mod pages;
mod projection;
mod view;

use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
    #[route("/embed")]
    Embed {},
}

#[component]
fn Home() -> Element {
    rsx! {
        pages::dashboard::DashboardPage { embedded: false }
    }
}

#[component]
fn Embed() -> Element {
    rsx! {
        pages::dashboard::DashboardPage { embedded: true }
    }
}

const CSS: Asset = asset!("/assets/main.css");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
