use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use odi_shared::bus::{LocalBus, Outbox, Payload, Publish, Topic};
use odi_shared::config::DashboardConfig;
use odi_shared::dashboard::{Dashboard, Panel};
use odi_shared::template::HtmlTemplates;

use crate::api;
use crate::components::choropleth::ChoroplethMap;
use crate::components::info_panel::InfoPanel;
use crate::components::legend::Legend;
use crate::components::place_box::PlaceBox;
use crate::components::share_panel::SharePanel;
use crate::components::tools::ToolsPanel;
use crate::projection;
use crate::view::{Screen, SignalView};

type WebDashboard = Dashboard<SignalView, HtmlTemplates>;

/// The dashboard and the bus it is subscribed to.
#[derive(Clone)]
struct Shell {
    dashboard: Rc<RefCell<WebDashboard>>,
    bus: Rc<RefCell<LocalBus>>,
}

impl Shell {
    fn new(screen: Signal<Screen>) -> Self {
        let location = web_sys::window().map(|w| w.location());
        let query = location
            .as_ref()
            .and_then(|l| l.search().ok())
            .unwrap_or_default();
        let config = DashboardConfig {
            embed_base_url: location
                .as_ref()
                .and_then(|l| l.origin().ok())
                .unwrap_or_default(),
            ..DashboardConfig::default()
        };

        let dashboard = Rc::new(RefCell::new(Dashboard::new(
            config,
            &query,
            SignalView::new(screen),
            HtmlTemplates,
        )));
        let mut bus = LocalBus::new();
        WebDashboard::attach(&dashboard, &mut bus);

        let shell = Shell {
            dashboard,
            bus: Rc::new(RefCell::new(bus)),
        };
        shell.dispatch(|d, out| d.init(out));
        shell
    }

    /// Run a dashboard action, then deliver whatever it published.
    fn dispatch(&self, action: impl FnOnce(&mut WebDashboard, &mut Outbox)) {
        let mut outbox = Outbox::new();
        action(&mut self.dashboard.borrow_mut(), &mut outbox);
        self.bus.borrow_mut().flush(outbox);
    }

    fn publish(&self, topic: Topic, payload: Payload) {
        self.bus.borrow_mut().publish(topic, payload);
    }

    /// Fetch every data topic and feed it to the bus. Places go last so the
    /// first full draw already has entries to color by.
    async fn load(&self, mut paths: Signal<Vec<String>>) {
        match api::fetch_meta().await {
            Ok(meta) => self.publish(Topic::Meta, Payload::Meta(meta)),
            Err(e) => tracing::error!("Failed to load meta: {e}"),
        }
        match api::fetch_datasets().await {
            Ok(datasets) => self.publish(Topic::Datasets, Payload::Datasets(datasets)),
            Err(e) => tracing::error!("Failed to load datasets: {e}"),
        }
        match api::fetch_summary().await {
            Ok(rows) => self.publish(Topic::Summary, Payload::Summary(rows)),
            Err(e) => tracing::error!("Failed to load summary: {e}"),
        }
        match api::fetch_entries().await {
            Ok(entries) => self.publish(Topic::Entries, Payload::Entries(entries)),
            Err(e) => tracing::error!("Failed to load entries: {e}"),
        }
        match api::fetch_places().await {
            Ok(payload) => {
                paths.set(projection::feature_paths(&payload.geo));
                self.publish(Topic::Places, Payload::Places(payload));
            }
            Err(e) => tracing::error!("Failed to load places: {e}"),
        }
    }
}

#[component]
pub fn DashboardPage(embedded: bool) -> Element {
    let screen = use_signal(Screen::default);
    let paths = use_signal(Vec::<String>::new);
    let shell = use_hook(move || Shell::new(screen));

    let loader = shell.clone();
    use_hook(move || {
        spawn(async move { loader.load(paths).await });
    });

    let page_url = use_hook(|| {
        web_sys::window()
            .and_then(|w| {
                let location = w.location();
                Some(format!("{}{}", location.origin().ok()?, location.pathname().ok()?))
            })
            .unwrap_or_default()
    });
    let triggers = use_hook({
        let shell = shell.clone();
        move || {
            shell
                .dashboard
                .borrow()
                .info_triggers()
                .iter()
                .cloned()
                .enumerate()
                .collect::<Vec<_>>()
        }
    });
    let (embed_triggers, help_triggers): (Vec<_>, Vec<_>) =
        triggers.into_iter().partition(|(_, t)| t.embed);

    let on_filters = use_callback({
        let shell = shell.clone();
        move |(year, dataset): (Option<String>, Option<String>)| {
            shell.dispatch(|d, out| d.select_filters(year, dataset, out))
        }
    });
    let on_select_place = use_callback({
        let shell = shell.clone();
        move |code: String| shell.dispatch(|d, out| d.select_place(&code, out))
    });
    let on_toggle_info = use_callback({
        let shell = shell.clone();
        move |index: usize| shell.dashboard.borrow_mut().toggle_info(index)
    });
    let on_close_info = use_callback({
        let shell = shell.clone();
        move |_: ()| shell.dashboard.borrow_mut().close_info()
    });

    let filter = shell.dashboard.borrow().state().filter.clone();
    let s = screen.read();
    let share_url = format!("{page_url}{}", s.query);

    rsx! {
        div { class: if embedded { "odi-vis embedded" } else { "odi-vis" },
            if s.is_visible(Panel::Tools) {
                ToolsPanel {
                    year_options: s.year_options.clone(),
                    dataset_options: s.dataset_options.clone(),
                    year: filter.year.clone(),
                    dataset: filter.dataset.clone(),
                    on_change: on_filters,
                }
            }

            div { class: "odi-vis-main",
                ChoroplethMap {
                    paths: paths.read().clone(),
                    layer: s.layer.clone(),
                    focused: s.focused.clone(),
                    on_select: on_select_place,
                }
                Legend { swatches: s.legend.clone() }
                PlaceBox { markup: s.place.clone() }
            }

            div { class: "sidebar",
                if s.is_visible(Panel::Share) {
                    SharePanel { url: share_url }
                }
                if s.is_visible(Panel::Embed) && !embed_triggers.is_empty() {
                    InfoPanel {
                        class: "odi-vis-embed",
                        triggers: embed_triggers,
                        active: s.active_trigger,
                        info: s.info.clone(),
                        on_toggle: on_toggle_info,
                        on_close: on_close_info,
                    }
                }
                if s.is_visible(Panel::Help) {
                    InfoPanel {
                        class: "odi-vis-help",
                        triggers: help_triggers,
                        active: s.active_trigger,
                        info: s.info.clone(),
                        on_toggle: on_toggle_info,
                        on_close: on_close_info,
                    }
                }
            }
        }
    }
}
