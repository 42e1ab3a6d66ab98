use chrono::{DateTime, Local};
use eframe::{App, egui};
use std::path::{Path, PathBuf};

use craft_core::{
    Change, ChildInfo, Document, DocPath, DocumentTree, EditSession, SchemaKind, Segment,
    SessionError, SessionOpts, TreeNode, inline_value,
};

struct State {
    root_dir: Option<PathBuf>,
    files: Vec<PathBuf>,
    selected_file: Option<usize>,
    doc_path: Option<PathBuf>,
    session: Option<EditSession>,
    max_history: usize,
    // Edit fields
    path_input: String,
    value_input: String,
    value_as_string: bool,
    keys_at: Option<DocPath>,
    keys: Vec<ChildInfo>,
    new_schema: SchemaKind,
    // Confirmation state
    confirm_delete: Option<String>,
    pending_changes: Option<Vec<Change>>,
    backup_on_save: bool,
    last_backup_time: Option<DateTime<Local>>,
    status: String,
}

impl Default for State {
    fn default() -> Self {
        Self {
            root_dir: None,
            files: Vec::new(),
            selected_file: None,
            doc_path: None,
            session: None,
            max_history: 0,
            path_input: String::new(),
            value_input: String::new(),
            value_as_string: false,
            keys_at: None,
            keys: Vec::new(),
            new_schema: SchemaKind::DockerCompose,
            confirm_delete: None,
            pending_changes: None,
            backup_on_save: true,
            last_backup_time: None,
            status: String::new(),
        }
    }
}

impl State {
    fn clear_document(&mut self) {
        self.session = None;
        self.doc_path = None;
        self.keys_at = None;
        self.keys.clear();
        self.confirm_delete = None;
        self.pending_changes = None;
    }

    fn start_session(&mut self, doc: Document) {
        self.session = Some(EditSession::with_opts(
            doc,
            SessionOpts {
                max_history: self.max_history,
            },
        ));
        self.keys_at = None;
        self.keys.clear();
        self.pending_changes = None;
    }

    fn input_value(&self) -> Document {
        if self.value_as_string {
            Document::from(self.value_input.as_str())
        } else {
            craft_core::parse_value(&self.value_input)
        }
    }

    fn report_error(&mut self, err: SessionError) {
        self.status = format!("Error: {}", err);
    }

    /// Back up and write the working copy. The session is replaced by a
    /// fresh one over the saved content only after the write succeeds.
    fn save_working(&mut self) {
        self.pending_changes = None;
        let (Some(path), Some(session)) = (self.doc_path.clone(), self.session.as_ref()) else {
            return;
        };
        let doc = session.working().clone();
        if self.backup_on_save && path.is_file() {
            match craft_core::zip_backup(&path) {
                Ok(_) => self.last_backup_time = Some(Local::now()),
                Err(e) => {
                    self.status = format!("Backup error: {}", e);
                    return;
                }
            }
        }
        match craft_core::save(&path, &doc) {
            Ok(()) => {
                self.status = format!("Saved {}", path.display());
                if let Some(session) = self.session.take() {
                    self.start_session(session.commit());
                }
            }
            Err(e) => self.status = format!("Save error: {}", e),
        }
    }
}

struct AppGui {
    state: State,
}

impl AppGui {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            state: State::default(),
        }
    }

    fn refresh_files(&mut self) {
        if let Some(root) = &self.state.root_dir {
            self.state.files = craft_core::find_documents(root);
            self.state.selected_file = None;
            self.state.status = if self.state.files.is_empty() {
                "No YAML/JSON documents found".into()
            } else {
                format!("Found {} document(s)", self.state.files.len())
            };
        }
    }

    fn pick_root_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().set_directory(".").pick_folder() {
            self.state.root_dir = Some(dir);
            self.refresh_files();
        }
    }

    fn pick_file(&mut self) {
        if let Some(file) = rfd::FileDialog::new()
            .add_filter("Config", &["yaml", "yml", "json"])
            .pick_file()
        {
            self.open(&file);
        }
    }

    fn open(&mut self, path: &Path) {
        self.state.clear_document();
        match craft_core::load(path) {
            Ok(Some(doc)) => {
                self.state.start_session(doc);
                self.state.doc_path = Some(path.to_path_buf());
                self.state.status = format!("Loaded {}", path.display());
            }
            Ok(None) => self.state.status = "No file selected".into(),
            Err(e) => self.state.status = format!("Load error: {}", e),
        }
    }

    fn new_from_template(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("YAML", &["yaml", "yml"])
            .add_filter("JSON", &["json"])
            .set_file_name(format!("{}.yaml", self.state.new_schema.name()))
            .save_file()
        else {
            return;
        };
        self.state.clear_document();
        // Nothing is written until the first confirmed save.
        self.state.start_session(self.state.new_schema.default_structure());
        self.state.doc_path = Some(path);
        self.state.status = format!("New {} document", self.state.new_schema.title());
    }

    fn backup_now(&mut self) {
        let Some(path) = self.state.doc_path.clone() else {
            return;
        };
        if !path.is_file() {
            self.state.status = "Nothing on disk to back up yet".into();
            return;
        }
        match craft_core::zip_backup(&path) {
            Ok(zip) => {
                self.state.status = format!("Backup created: {}", zip.display());
                self.state.last_backup_time = Some(Local::now());
            }
            Err(e) => self.state.status = format!("Backup error: {}", e),
        }
    }

    fn apply_set(&mut self) {
        let value = self.state.input_value();
        let Some(session) = &mut self.state.session else {
            return;
        };
        match session.set(&self.state.path_input, value) {
            Ok(path) => self.state.status = format!("Updated {}", path),
            Err(e) => self.state.report_error(e),
        }
    }

    fn apply_append(&mut self) {
        let value = self.state.input_value();
        let Some(session) = &mut self.state.session else {
            return;
        };
        match session.append(&self.state.path_input, value) {
            Ok(path) => self.state.status = format!("Appended to {}", path),
            Err(e) => self.state.report_error(e),
        }
    }

    fn apply_delete(&mut self, path: &str) {
        let Some(session) = &mut self.state.session else {
            return;
        };
        match session.delete(path) {
            Ok((path, removed)) => {
                self.state.status = format!("Deleted {} (was {})", path, inline_value(&removed));
                self.state.path_input = path.parent().map(|p| path_text(&p)).unwrap_or_default();
            }
            Err(e) => self.state.report_error(e),
        }
    }

    fn show_keys(&mut self) {
        let Some(session) = &self.state.session else {
            return;
        };
        match session.show_keys(&self.state.path_input) {
            Ok((path, children)) => {
                self.state.status = format!("{} key(s) under {}", children.len(), path);
                self.state.keys_at = Some(path);
                self.state.keys = children;
            }
            Err(e) => self.state.report_error(e),
        }
    }

    fn undo(&mut self) {
        let Some(session) = &mut self.state.session else {
            return;
        };
        match session.undo() {
            Ok(()) => self.state.status = "Undid last change".into(),
            Err(e) => self.state.report_error(e),
        }
    }
}

impl App for AppGui {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Folder").clicked() {
                    self.pick_root_dir();
                }
                if ui.button("Open File").clicked() {
                    self.pick_file();
                }
                ui.separator();
                egui::ComboBox::from_id_source("schema")
                    .selected_text(self.state.new_schema.title())
                    .show_ui(ui, |ui| {
                        for kind in SchemaKind::ALL {
                            ui.selectable_value(&mut self.state.new_schema, kind, kind.title());
                        }
                    });
                if ui.button("New from template").clicked() {
                    self.new_from_template();
                }
                ui.separator();
                if ui.button("Create Backup Now").clicked() {
                    self.backup_now();
                }
                ui.checkbox(&mut self.state.backup_on_save, "Zip backup on save");
                if let Some(time) = self.state.last_backup_time {
                    ui.label(format!("Last backup: {}", time.format("%Y-%m-%d %H:%M:%S")));
                }
                ui.label(&self.state.status);
            });
        });

        egui::SidePanel::left("left").show(ctx, |ui| {
            ui.heading("Documents");
            if let Some(root) = &self.state.root_dir {
                ui.label(format!("Root: {}", root.display()));
                if ui.button("Rescan").clicked() {
                    self.refresh_files();
                }
            }
            let mut clicked_index: Option<usize> = None;
            egui::ScrollArea::vertical()
                .id_source("files_scroll")
                .show(ui, |ui| {
                    for (i, p) in self.state.files.iter().enumerate() {
                        let sel = Some(i) == self.state.selected_file;
                        let label = match &self.state.root_dir {
                            Some(root) => p.strip_prefix(root).unwrap_or(p.as_path()).display().to_string(),
                            None => p.display().to_string(),
                        };
                        if ui.selectable_label(sel, label).clicked() {
                            clicked_index = Some(i);
                        }
                    }
                });
            if let Some(i) = clicked_index
                && let Some(p) = self.state.files.get(i).cloned()
            {
                self.state.selected_file = Some(i);
                self.open(&p);
            }
            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Undo levels (0 = unlimited):");
                ui.add(egui::DragValue::new(&mut self.state.max_history).speed(1));
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel")
            .resizable(true)
            .default_height(260.0)
            .show(ctx, |ui| self.edit_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.state.session else {
                ui.label("Open a folder or file to start editing.");
                return;
            };
            ui.horizontal(|ui| {
                if let Some(p) = &self.state.doc_path {
                    ui.heading(p.display().to_string());
                }
                if session.is_dirty() {
                    ui.colored_label(egui::Color32::YELLOW, "modified");
                }
            });
            ui.separator();
            let tree = DocumentTree::from_document(session.working());
            let mut picked: Option<DocPath> = None;
            egui::ScrollArea::vertical()
                .id_source("tree_scroll")
                .show(ui, |ui| {
                    let base = if tree.virtual_root {
                        DocPath::root()
                    } else {
                        DocPath::from_segments(vec![Segment::Field(tree.root.key.clone())])
                    };
                    if tree.virtual_root {
                        for child in &tree.root.children {
                            let path = base.child(Segment::Field(child.key.clone()));
                            tree_ui(ui, child, path, 0, &mut picked);
                        }
                    } else {
                        tree_ui(ui, &tree.root, base, 0, &mut picked);
                    }
                });
            if let Some(p) = picked {
                self.state.path_input = path_text(&p);
            }
        });
    }
}

impl AppGui {
    fn edit_panel(&mut self, ui: &mut egui::Ui) {
        if self.state.session.is_none() {
            ui.label("No document loaded");
            return;
        }
        ui.horizontal(|ui| {
            ui.label("Path:");
            ui.text_edit_singleline(&mut self.state.path_input);
            ui.label("Value:");
            ui.text_edit_singleline(&mut self.state.value_input);
            ui.checkbox(&mut self.state.value_as_string, "as string");
        });
        ui.horizontal(|ui| {
            if ui.button("Set").clicked() {
                self.apply_set();
            }
            if ui.button("Append").clicked() {
                self.apply_append();
            }
            if ui.button("Delete").clicked() {
                self.state.confirm_delete = Some(self.state.path_input.clone());
            }
            if ui.button("Show keys").clicked() {
                self.show_keys();
            }
            let can_undo = self.state.session.as_ref().is_some_and(|s| s.can_undo());
            if ui
                .add_enabled(can_undo, egui::Button::new("Undo"))
                .clicked()
            {
                self.undo();
            }
            if let Some(s) = &self.state.session {
                ui.label(format!("{} undo level(s)", s.undo_levels()));
            }
        });

        if let Some(target) = self.state.confirm_delete.clone() {
            ui.horizontal(|ui| {
                ui.label(format!("Confirm delete of {}?", target));
                if ui.button("Confirm").clicked() {
                    self.apply_delete(&target);
                    self.state.confirm_delete = None;
                }
                if ui.button("Cancel").clicked() {
                    self.state.confirm_delete = None;
                }
            });
        }

        if let Some(at) = self.state.keys_at.clone() {
            ui.collapsing(format!("Keys under {}", at), |ui| {
                let mut picked: Option<DocPath> = None;
                egui::ScrollArea::vertical()
                    .id_source("keys_scroll")
                    .max_height(100.0)
                    .show(ui, |ui| {
                        for c in &self.state.keys {
                            let label = match c.len {
                                Some(n) => format!("{} ({}, {})", c.key_or_index, c.kind, n),
                                None => format!("{} ({})", c.key_or_index, c.kind),
                            };
                            let target = at.child(child_segment(&c.key_or_index));
                            if pick_label(ui, label, &target) {
                                picked = Some(target);
                            }
                        }
                    });
                if let Some(p) = picked {
                    self.state.path_input = path_text(&p);
                }
            });
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Preview & Save").clicked()
                && let Some(s) = &self.state.session
            {
                self.state.pending_changes = Some(s.preview());
            }
        });

        if let Some(changes) = self.state.pending_changes.clone() {
            egui::ScrollArea::vertical()
                .id_source("preview_scroll")
                .max_height(120.0)
                .show(ui, |ui| {
                    if changes.is_empty() {
                        ui.label("No changes.");
                    }
                    for c in &changes {
                        ui.monospace(c.to_string());
                    }
                });
            ui.horizontal(|ui| {
                ui.label("Save these changes?");
                if ui.button("Confirm").clicked() {
                    self.state.save_working();
                }
                if ui.button("Keep editing").clicked() {
                    self.state.pending_changes = None;
                    self.state.status = "Not saved; still editing".into();
                }
            });
        }
    }
}

fn tree_ui(
    ui: &mut egui::Ui,
    node: &TreeNode,
    path: DocPath,
    depth: usize,
    picked: &mut Option<DocPath>,
) {
    match &node.value {
        Some(v) => {
            let label = format!("{}: {}", node.key, inline_value(v));
            if pick_label(ui, label, &path) {
                *picked = Some(path);
            }
        }
        None => {
            egui::CollapsingHeader::new(format!("{}:", node.key))
                .id_source(&path)
                .default_open(depth < 2)
                .show(ui, |ui| {
                    if path.is_addressable() {
                        if ui.small_button("use this path").clicked() {
                            *picked = Some(path.clone());
                        }
                    } else {
                        ui.weak(UNADDRESSABLE);
                    }
                    for child in &node.children {
                        let child_path = path.child(Segment::Field(child.key.clone()));
                        tree_ui(ui, child, child_path, depth + 1, picked);
                    }
                });
        }
    }
}

const UNADDRESSABLE: &str = "key contains '.', '[' or ']' and cannot be reached by a path";

/// Clickable label for a node; keys that have no path form are shown disabled.
fn pick_label(ui: &mut egui::Ui, label: String, path: &DocPath) -> bool {
    let addressable = path.is_addressable();
    ui.add_enabled(addressable, egui::SelectableLabel::new(false, label))
        .on_disabled_hover_text(UNADDRESSABLE)
        .clicked()
}

/// Path as typed into the path field; the root is the empty string.
fn path_text(path: &DocPath) -> String {
    if path.is_root() {
        String::new()
    } else {
        path.to_string()
    }
}

fn child_segment(key_or_index: &str) -> Segment {
    key_or_index
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .and_then(|s| s.parse().ok())
        .map(Segment::Index)
        .unwrap_or_else(|| Segment::Field(key_or_index.to_string()))
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let native_options = eframe::NativeOptions {
        viewport: egui::viewport::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "ContainCraft",
        native_options,
        Box::new(|cc| Ok(Box::new(AppGui::new(cc)))),
    )
}
