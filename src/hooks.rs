use gloo_timers::callback::Interval;
use log::warn;
use portfolio_shell::config::{COUNTER_DURATION_MS, COUNTER_TICK_MS};
use portfolio_shell::page::apply_theme;
use portfolio_shell::prefs::{load_theme, record_visit, save_theme, LocalStore};
use portfolio_shell::utils::CounterAnimation;
use portfolio_shell::Theme;
use yew::prelude::*;

/// Current theme plus a callback that flips and persists it.
#[derive(Clone)]
pub struct ThemeHandle {
    pub theme: Theme,
    pub toggle: Callback<()>,
}

#[hook]
pub fn use_theme() -> ThemeHandle {
    let theme = use_state(|| match LocalStore::open() {
        Ok(store) => load_theme(&store),
        Err(err) => {
            warn!("{}", err);
            Theme::default()
        }
    });

    // Keep <html data-theme> in step with the state
    use_effect_with(*theme, |current| apply_theme(*current));

    let toggle = {
        let theme = theme.clone();
        Callback::from(move |_| {
            let next = theme.toggled();
            if let Ok(store) = LocalStore::open() {
                save_theme(&store, next);
            }
            theme.set(next);
        })
    };

    ThemeHandle {
        theme: *theme,
        toggle,
    }
}

/// Total visits including this one; `None` until recorded.
#[hook]
pub fn use_visit_count() -> Option<u64> {
    let visits = use_state(|| None::<u64>);
    {
        let visits = visits.clone();
        use_effect_with((), move |_| match LocalStore::open() {
            Ok(store) => visits.set(Some(record_visit(&store))),
            Err(err) => warn!("Visit not recorded: {}", err),
        });
    }
    *visits
}

/// Number that counts up from zero to `target` once after mount. The
/// ticker is cancelled on unmount or when `target` changes.
#[hook]
pub fn use_counter(target: i64) -> i64 {
    let value = use_state(|| 0i64);
    {
        let value = value.clone();
        use_effect_with(target, move |target| {
            let mut animation =
                CounterAnimation::new(0, *target, COUNTER_DURATION_MS, COUNTER_TICK_MS);
            let ticker = Interval::new(COUNTER_TICK_MS, move || {
                if let Some(shown) = animation.tick() {
                    value.set(shown);
                }
            });
            move || drop(ticker)
        });
    }
    *value
}
