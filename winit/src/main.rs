// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use std::cell::RefCell;
use std::rc::Rc;

use slint::{Color, ComponentHandle, ModelRc, SharedString, Timer, TimerMode, VecModel};
use temperature_monitor_common::plot::VIEWBOX_SIZE;
use temperature_monitor_common::{
    AlarmState, Backdrop, BlinkChange, Monitor, Settings, StatusTone, Tick,
};

type SharedMonitor = Rc<RefCell<Monitor>>;

/// Our App struct that holds the UI, the monitoring session and the two timers driving it.
///
/// The sample timer pulls a new reading every `sample_interval_ms`, the blink timer flashes the
/// plot background while the latest reading is out of bounds. Both run on the UI thread, so the
/// session lives in an `Rc<RefCell>` shared by the timer and button callbacks.
struct App {
    ui: AppWindow,
    settings: Settings,
    monitor: SharedMonitor,
    sample_timer: Rc<Timer>,
    blink_timer: Rc<Timer>,
}

impl App {
    /// Create a new App struct and wire up the UI callbacks.
    fn new(settings: Settings) -> anyhow::Result<Self> {
        // Make a new AppWindow
        let ui = AppWindow::new()?;

        let monitor = Rc::new(RefCell::new(Monitor::new(&settings)?));

        let app = Self {
            ui,
            settings,
            monitor,
            sample_timer: Rc::new(Timer::default()),
            blink_timer: Rc::new(Timer::default()),
        };

        app.connect_callbacks();
        refresh(&app.ui, &app.monitor.borrow());

        Ok(app)
    }

    fn connect_callbacks(&self) {
        let model = self.ui.global::<ViewModel>();

        model.on_start({
            let context = self.context();
            let sample_timer = self.sample_timer.clone();
            let interval = self.settings.sample_interval();
            move || {
                if !context.monitor.borrow_mut().start() {
                    return;
                }

                let timer_context = context.clone();
                sample_timer.start(TimerMode::Repeated, interval, move || timer_context.on_sample());
                context.redraw();
            }
        });

        model.on_stop({
            let context = self.context();
            let sample_timer = self.sample_timer.clone();
            move || {
                sample_timer.stop();
                let change = context.monitor.borrow_mut().stop();
                context.apply_blink(change);
                context.redraw();
            }
        });

        model.on_min_limit_stepped({
            let context = self.context();
            move |steps| {
                let change = context.monitor.borrow_mut().step_min_limit(steps);
                context.apply_blink(change);
                context.redraw();
            }
        });

        model.on_max_limit_stepped({
            let context = self.context();
            move |steps| {
                let change = context.monitor.borrow_mut().step_max_limit(steps);
                context.apply_blink(change);
                context.redraw();
            }
        });

        model.on_zoom_in({
            let context = self.context();
            move || {
                context.monitor.borrow_mut().zoom_in();
                context.redraw();
            }
        });

        model.on_zoom_out({
            let context = self.context();
            move || {
                context.monitor.borrow_mut().zoom_out();
                context.redraw();
            }
        });

        model.on_auto_range({
            let context = self.context();
            move || {
                context.monitor.borrow_mut().auto_range();
                context.redraw();
            }
        });
    }

    fn context(&self) -> Rc<CallbackContext> {
        Rc::new(CallbackContext {
            ui: self.ui.as_weak(),
            monitor: self.monitor.clone(),
            blink_timer: self.blink_timer.clone(),
            blink_interval: self.settings.blink_interval(),
        })
    }

    /// Run the App until the window is closed.
    fn run(&self) -> anyhow::Result<()> {
        log::info!(
            "Sampling every {} ms, keeping {} readings",
            self.settings.sample_interval_ms,
            self.settings.history_len
        );

        // Run the UI (and map an error to an anyhow::Error).
        let result = self.ui.run().map_err(|e| e.into());

        self.sample_timer.stop();
        self.blink_timer.stop();

        result
    }
}

/// What a UI or timer callback needs to act on the session and repaint.
struct CallbackContext {
    ui: slint::Weak<AppWindow>,
    monitor: SharedMonitor,
    blink_timer: Rc<Timer>,
    blink_interval: std::time::Duration,
}

impl CallbackContext {
    fn on_sample(self: &Rc<Self>) {
        let outcome = self.monitor.borrow_mut().tick();
        if let Some(outcome) = outcome {
            self.apply_blink(outcome.blink);

            if let Some(ui) = self.ui.upgrade() {
                let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
                ui.global::<ViewModel>().set_last_update(stamp.into());
            }
        }
        self.redraw();
    }

    /// Start or stop the blink timer to follow the alarm.
    fn apply_blink(self: &Rc<Self>, change: BlinkChange) {
        match change {
            BlinkChange::Started => {
                // The timer is owned by the context, so only hold a weak reference back to it.
                let context = Rc::downgrade(self);
                self.blink_timer.start(TimerMode::Repeated, self.blink_interval, move || {
                    if let Some(context) = context.upgrade() {
                        context.monitor.borrow_mut().blink_tick();
                        context.redraw();
                    }
                });
            }
            BlinkChange::Stopped => self.blink_timer.stop(),
            BlinkChange::Unchanged => {}
        }
    }

    fn redraw(&self) {
        if let Some(ui) = self.ui.upgrade() {
            refresh(&ui, &self.monitor.borrow());
        }
    }
}

/// Copy the state of the session into the view model.
fn refresh(ui: &AppWindow, monitor: &Monitor) {
    let model = ui.global::<ViewModel>();
    let frame = monitor.plot_frame();

    model.set_viewbox_size(VIEWBOX_SIZE as f32);
    model.set_curve_commands(frame.curve.into());
    model.set_x_ticks(ticks_model(frame.x_ticks));
    model.set_y_ticks(ticks_model(frame.y_ticks));

    model.set_upper_limit_visible(frame.upper_limit.is_some());
    model.set_upper_limit_position(frame.upper_limit.unwrap_or_default() as f32);
    model.set_lower_limit_visible(frame.lower_limit.is_some());
    model.set_lower_limit_position(frame.lower_limit.unwrap_or_default() as f32);

    model.set_plot_background(backdrop_color(monitor.backdrop()));

    let bounds = monitor.bounds();
    model.set_running(monitor.is_running());
    model.set_min_limit_text(SharedString::from(format!("{:.1}", bounds.min)));
    model.set_max_limit_text(SharedString::from(format!("{:.1}", bounds.max)));

    let status = monitor.status();
    let (background, foreground) = status_colors(status.tone);
    model.set_status_text(status.text.into());
    model.set_status_background(background);
    model.set_status_foreground(foreground);
}

fn ticks_model(ticks: Vec<Tick>) -> ModelRc<AxisTick> {
    let ticks: Vec<AxisTick> = ticks.into_iter().map(AxisTick::from).collect();
    ModelRc::new(VecModel::from(ticks))
}

/// Convert a plot tick into the UI struct.
impl From<Tick> for AxisTick {
    fn from(tick: Tick) -> Self {
        Self {
            position: tick.position as f32,
            label: tick.label.into(),
        }
    }
}

fn status_colors(tone: StatusTone) -> (Color, Color) {
    let white = Color::from_rgb_u8(0xff, 0xff, 0xff);
    let black = Color::from_rgb_u8(0x00, 0x00, 0x00);

    match tone {
        // lightgrey
        StatusTone::Idle => (Color::from_rgb_u8(0xd3, 0xd3, 0xd3), black),
        StatusTone::Ok => (Color::from_rgb_u8(0xa5, 0xd6, 0xa7), black),
        StatusTone::AboveMax => (Color::from_rgb_u8(0xef, 0x53, 0x50), white),
        StatusTone::BelowMin => (Color::from_rgb_u8(0x42, 0xa5, 0xf5), white),
    }
}

fn backdrop_color(backdrop: Backdrop) -> Color {
    match backdrop {
        Backdrop::Plain | Backdrop::Highlight(AlarmState::Normal) => Color::from_rgb_u8(0xff, 0xff, 0xff),
        Backdrop::Highlight(AlarmState::AboveMax) => Color::from_rgb_u8(0xff, 0xcd, 0xd2),
        Backdrop::Highlight(AlarmState::BelowMin) => Color::from_rgb_u8(0xbb, 0xde, 0xfb),
    }
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = Settings::from_env();
    let app = App::new(settings)?;

    app.run()
}
