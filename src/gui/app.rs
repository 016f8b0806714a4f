//! Chart window implemented with egui/eframe

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use eframe::{egui, CreationContext, NativeOptions};
use tracing::{debug, info, warn};

use dental_chart::chart::ToothRecordStore;
use dental_chart::chart_view::ChartView;
use dental_chart::config::Config;
use dental_chart::interaction::ChartIntent;
use dental_chart::ipc::{self, SyncClient, SyncLink};
use dental_chart::preference::{DesignPreference, FileStorage, PreferenceStore, ViewId};

use super::components::design_selector::{self, DesignAction};
use super::components::details_panel::{self, PanelAction};
use super::constants::*;
use super::painter::paint_chart;

/// What a `view` invocation asked for
pub struct ViewOptions {
    pub config: Config,
    pub records: ToothRecordStore,
    pub design: Option<DesignPreference>,
    pub title: String,
}

struct ChartApp {
    view: ChartView,
    intents_tx: Sender<ChartIntent>,
    intents_rx: Receiver<ChartIntent>,
    synced: bool,
    /// Hub process this window started, until it has been reaped
    hub: Option<Child>,
}

impl ChartApp {
    fn new(_cc: &CreationContext<'_>, options: ViewOptions) -> Self {
        info!("Initializing chart window");

        let view_id = ViewId::generate();
        let mut store = PreferenceStore::open(Box::new(FileStorage::new()), view_id);

        let (link, hub) = if options.config.sync_enabled {
            connect_sync(view_id)
        } else {
            info!("Cross-view sync disabled in config");
            (None, None)
        };

        let synced = link.is_some();
        let remote = link.map(|link| {
            store.set_publisher(Box::new(link.publisher));
            link.changes
        });

        let mut view = ChartView::mount(options.records, store.into_shared(), options.config.layout);
        if let Some(remote) = remote {
            view = view.with_remote(remote);
        }
        if let Some(design) = options.design {
            view.set_design(design);
        }

        let (intents_tx, intents_rx) = mpsc::channel();
        Self { view, intents_tx, intents_rx, synced, hub }
    }

    /// Intents go to the owner of clinical data; this host only records them
    fn drain_intents(&mut self) {
        while let Ok(intent) = self.intents_rx.try_recv() {
            match intent {
                ChartIntent::ToothHovered(tooth) => debug!(tooth = ?tooth, "Tooth hovered"),
                other => info!(intent = ?other, "Chart intent"),
            }
        }
    }
}

impl eframe::App for ChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.view.poll_remote() {
            info!(design = %self.view.design(), "Design changed in another view");
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(PADDING);
            match design_selector::ui(ui, self.view.layout(), self.synced) {
                DesignAction::SwitchDesign(design) => {
                    self.view.set_design(design);
                }
                DesignAction::ToggleDensity => {
                    if let Some(density) = self.view.toggle_density() {
                        debug!(density = density.label(), "Ring density toggled");
                    }
                }
                DesignAction::None => {}
            }
            ui.add_space(PADDING);
        });

        let tree = self.view.render();

        egui::SidePanel::right("details")
            .default_width(DETAILS_PANEL_WIDTH)
            .show(ctx, |ui| {
                ui.add_space(PADDING);
                match details_panel::ui(ui, &tree) {
                    PanelAction::Tooth(action, tooth) => {
                        self.view.action(action, tooth, &mut self.intents_tx);
                    }
                    PanelAction::Tab(tab) => {
                        self.view.set_clinical_tab(tab);
                    }
                    PanelAction::None => {}
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let input = paint_chart(ui, &tree);
            self.view.pointer_at(input.pointer, input.clicked, &mut self.intents_tx);
        });

        self.drain_intents();
        if let Some(status) = reap_hub(&mut self.hub) {
            info!(status = %status, "Sync hub process exited");
        }
        ctx.request_repaint_after(Duration::from_millis(SYNC_POLL_INTERVAL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Chart window exiting");
    }
}

/// Join the running hub, starting a standalone one if needed. Returns the
/// hub process when this window started it.
fn connect_sync(view: ViewId) -> (Option<SyncLink>, Option<Child>) {
    let path = match ipc::default_socket_path() {
        Ok(path) => path,
        Err(e) => {
            warn!(error = ?e, "No location for the sync socket, running unsynchronized");
            return (None, None);
        }
    };

    if let Ok(client) = SyncClient::connect_to(&path, view) {
        return (start_link(client), None);
    }

    let mut hub = match spawn_hub_process() {
        Ok(child) => Some(child),
        Err(e) => {
            warn!(error = ?e, "Failed to spawn sync hub, hosting one in this window");
            None
        }
    };
    if hub.is_some() {
        if let Some(client) = wait_for_hub(&path, view) {
            return (start_link(client), hub);
        }
        warn!("Spawned sync hub did not come up, hosting one in this window");
        if let Some(status) = reap_hub(&mut hub) {
            warn!(status = %status, "Sync hub process exited early");
        }
    }

    (ipc::join_or_host(&path, view), hub)
}

/// Collect the exit status of a finished hub process. A hub that is still
/// running is left alone; other windows may be using it.
fn reap_hub(hub: &mut Option<Child>) -> Option<ExitStatus> {
    let child = hub.as_mut()?;
    match child.try_wait() {
        Ok(Some(status)) => {
            hub.take();
            Some(status)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = ?e, "Failed to poll sync hub process, no longer tracking it");
            hub.take();
            None
        }
    }
}

fn start_link(client: SyncClient) -> Option<SyncLink> {
    client
        .start()
        .inspect_err(|e| warn!(error = ?e, "Failed to start sync reader"))
        .ok()
}

fn wait_for_hub(path: &Path, view: ViewId) -> Option<SyncClient> {
    for attempt in 0..HUB_CONNECT_ATTEMPTS {
        std::thread::sleep(Duration::from_millis(HUB_CONNECT_RETRY_MS));
        match SyncClient::connect_to(path, view) {
            Ok(client) => return Some(client),
            Err(e) => debug!(attempt, error = ?e, "Sync hub not ready yet"),
        }
    }
    None
}

/// The hub outlives this window and exits once every view is gone
fn spawn_hub_process() -> Result<Child> {
    let exe_path = std::env::current_exe().context("Failed to resolve executable path")?;
    let child = Command::new(exe_path)
        .args(["hub", "--exit-when-idle"])
        .stdin(Stdio::null())
        .spawn()
        .context("Failed to spawn sync hub")?;
    info!(pid = child.id(), "Started sync hub");
    Ok(child)
}

pub fn run_gui(options: ViewOptions) -> Result<()> {
    let title = options.title.clone();
    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([options.config.window.width as f32, options.config.window.height as f32])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        native_options,
        Box::new(|cc| Ok(Box::new(ChartApp::new(cc, options)))),
    )
    .map_err(|err| anyhow!("Failed to launch chart window: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reap_hub_collects_finished_process() {
        let mut hub = Some(Command::new("true").spawn().unwrap());
        let mut status = None;
        for _ in 0..100 {
            status = reap_hub(&mut hub);
            if status.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(status.unwrap().success());
        assert!(hub.is_none());
        assert_eq!(reap_hub(&mut hub), None);
    }

    #[test]
    fn test_reap_hub_leaves_running_process() {
        let mut hub = Some(Command::new("sleep").arg("5").spawn().unwrap());
        assert_eq!(reap_hub(&mut hub), None);
        assert!(hub.is_some());
        if let Some(mut child) = hub {
            child.kill().unwrap();
            child.wait().unwrap();
        }
    }
}
