//! View components for the portfolio page.

use crate::hooks::use_counter;
use portfolio_shell::animator::start_unless_reduced_motion;
use portfolio_shell::utils::format_count;
use portfolio_shell::Theme;
use web_sys::HtmlCanvasElement;
use yew::prelude::*;

/// Full-viewport particle canvas behind the page content.
///
/// The animator is created on mount and dropped on unmount, which cancels
/// its frame loop.
#[function_component(ParticleCanvas)]
pub fn particle_canvas() -> Html {
    let canvas_ref = use_node_ref();
    {
        let canvas_ref = canvas_ref.clone();
        use_effect_with((), move |_| {
            let animator = canvas_ref
                .cast::<HtmlCanvasElement>()
                .and_then(start_unless_reduced_motion);
            move || drop(animator)
        });
    }

    html! {
        <canvas id="particleCanvas" class="particle-canvas" ref={canvas_ref} aria-hidden="true" />
    }
}

#[derive(Properties, PartialEq)]
pub struct ThemeToggleProps {
    pub theme: Theme,
    pub on_toggle: Callback<()>,
}

#[function_component(ThemeToggle)]
pub fn theme_toggle(props: &ThemeToggleProps) -> Html {
    let label = format!("Switch to {} mode", props.theme.toggled());
    html! {
        <button id="darkModeToggle"
            class="theme-toggle"
            aria-label={label}
            onclick={props.on_toggle.reform(|_| ())}
        >
            <span id="darkModeIcon" class="material-symbols-outlined">
                { props.theme.toggle_icon() }
            </span>
        </button>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatCounterProps {
    pub label: AttrValue,
    pub target: i64,
}

#[function_component(StatCounter)]
pub fn stat_counter(props: &StatCounterProps) -> Html {
    let value = use_counter(props.target);
    html! {
        <div class="stat-card">
            <span class="stat-number">{ value }</span>
            <span class="stat-label">{ props.label.clone() }</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct VisitorBadgeProps {
    pub count: Option<u64>,
}

#[function_component(VisitorBadge)]
pub fn visitor_badge(props: &VisitorBadgeProps) -> Html {
    match props.count {
        Some(count) => html! {
            <div class="visitor-badge">
                { "Visits: " }
                <span id="visitorCount">{ format_count(count) }</span>
            </div>
        },
        None => html! {},
    }
}
