//! Portfolio page built with Yew.
//! Composes the independent page features once at startup.

use portfolio_shell::config::{LOG_LEVEL, SERVICE_WORKER_SCRIPT, STAT_COUNTERS};
use portfolio_shell::logging;
use portfolio_shell::page::register_service_worker_on_load;
use yew::prelude::*;

mod components;
mod hooks;

use components::{ParticleCanvas, StatCounter, ThemeToggle, VisitorBadge};
use hooks::{use_theme, use_visit_count};

/// Page content: header with theme toggle, stats strip, footer badge.
#[function_component(Main)]
fn main_component() -> Html {
    let theme = use_theme();
    let visits = use_visit_count();

    html! {
        <>
            <header class="hidey-bar">
                <a class="brand" href="#top">{ "Portfolio" }</a>
                <ThemeToggle theme={theme.theme} on_toggle={theme.toggle.clone()} />
            </header>

            <main id="top">
                <section class="stats-dashboard">
                    { STAT_COUNTERS.iter().map(|&(label, target)| html! {
                        <StatCounter label={label} target={target} />
                    }).collect::<Html>() }
                </section>
            </main>

            <footer class="site-footer">
                <VisitorBadge count={visits} />
            </footer>
        </>
    }
}

/// Root component: particle backdrop, page content, and the offline
/// service worker registered once on mount.
#[function_component]
pub fn App() -> Html {
    use_effect_with((), |_| {
        register_service_worker_on_load(SERVICE_WORKER_SCRIPT);
    });

    html! {
        <>
            <ParticleCanvas />
            <Main />
        </>
    }
}

/// Entry point: installs logging and renders the App component.
fn main() {
    console_error_panic_hook::set_once();
    logging::init(LOG_LEVEL);
    yew::Renderer::<App>::new().render();
}
