use craft_core::session::{Action, EditSession, Frontend, Report, SessionEnd, run};
use craft_core::{
    Change, DocPath, Document, DocumentTree, NodeKind, PathError, SchemaError, SchemaKind,
    SessionError, append, delete, get, parse_value, set,
};

fn doc(text: &str) -> Document {
    serde_yaml::from_str(text).unwrap()
}

fn p(text: &str) -> DocPath {
    DocPath::parse(text).unwrap()
}

#[test]
fn scenario_a_set_then_get() {
    let mut d = doc("services:\n  web:\n    image: nginx\n");
    set(&mut d, &p("services.web.restart"), "always".into()).unwrap();
    assert_eq!(get(&d, &p("services.web.restart")).unwrap(), &Document::from("always"));
}

#[test]
fn scenario_b_append_to_missing_list_fails_without_change() {
    let mut d = doc("services:\n  web:\n    image: nginx\n");
    let before = d.clone();
    let err = append(&mut d, &p("services.web.ports"), "8080:80".into()).unwrap_err();
    assert!(matches!(err, PathError::NotFound { .. }));
    assert_eq!(d, before);

    let mut s = EditSession::new(before.clone());
    assert!(s.append("services.web.ports", "8080:80".into()).is_err());
    assert_eq!(s.working(), &before);
    assert_eq!(s.undo_levels(), 0);
}

#[test]
fn scenario_c_virtual_root_round_trip() {
    let d = doc("a: 1\nb: 2\n");
    let tree = DocumentTree::from_document(&d);
    assert!(tree.virtual_root);
    assert_eq!(tree.root.key, "");
    assert_eq!(tree.root.children.len(), 2);
    assert!(tree.root.children.iter().all(|c| c.is_leaf()));
    assert_eq!(tree.to_document(), d);
    let text = serde_yaml::to_string(&tree.to_document()).unwrap();
    assert_eq!(text, "a: 1\nb: 2\n");
}

#[test]
fn scenario_d_two_sets_two_undos_restore_original() {
    let original = doc("services:\n  web:\n    image: nginx\n");
    let mut s = EditSession::new(original.clone());
    s.set("services.web.image", "nginx:1.25".into()).unwrap();
    s.set("services.web.restart", "always".into()).unwrap();
    assert!(s.is_dirty());
    s.undo().unwrap();
    s.undo().unwrap();
    assert_eq!(s.working(), &original);
    assert_eq!(s.undo(), Err(SessionError::NothingToUndo));
}

#[test]
fn scenario_e_indexed_paths() {
    let d = doc("arr:\n  - name: x\n");
    assert_eq!(get(&d, &p("arr[0].name")).unwrap(), &Document::from("x"));
    match get(&d, &p("arr[1].name")) {
        Err(PathError::IndexOutOfRange { index, len, path }) => {
            assert_eq!((index, len), (1, 1));
            assert_eq!(path, "arr[1]");
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn round_trip_holds_for_mapping_documents() {
    let samples = [
        "version: '3'\nservices:\n  web:\n    image: nginx\n    ports: ['80:80']\n    environment: {}\n",
        "cluster:\n  zookeeper: zk:2181\n  brokers:\n    broker-1:\n      broker.id: 1\n",
        "{}",
        "a: null\nb: [1, {c: 2}]\nc: {d: {e: true}}\n",
    ];
    for text in samples {
        let d = doc(text);
        let back = DocumentTree::from_document(&d).to_document();
        // `==` on mappings ignores key order
        assert_eq!(
            serde_yaml::to_string(&back).unwrap(),
            serde_yaml::to_string(&d).unwrap(),
            "{text}"
        );
    }
}

#[test]
fn reads_are_idempotent() {
    let d = doc("a:\n  b: [1, 2, 3]\n");
    let first = get(&d, &p("a.b[2]")).unwrap().clone();
    let second = get(&d, &p("a.b[2]")).unwrap().clone();
    assert_eq!(first, second);
    assert_eq!(get(&d, &DocPath::root()).unwrap(), &d);
}

#[test]
fn write_then_read_on_keys_and_indices() {
    let mut d = doc("a:\n  list: [1, 2]\n");
    set(&mut d, &p("a.list[1]"), 20.into()).unwrap();
    assert_eq!(get(&d, &p("a.list[1]")).unwrap(), &Document::from(20));
    set(&mut d, &p("a.new"), parse_value("{k: v}")).unwrap();
    assert_eq!(get(&d, &p("a.new.k")).unwrap(), &Document::from("v"));
}

#[test]
fn set_overwrites_in_place_keeping_key_order() {
    let mut d = doc("first: 1\nsecond: 2\nthird: 3\n");
    set(&mut d, &p("second"), 22.into()).unwrap();
    assert_eq!(serde_yaml::to_string(&d).unwrap(), "first: 1\nsecond: 22\nthird: 3\n");
}

#[test]
fn set_never_creates_intermediate_containers() {
    let mut d = doc("a: {}\n");
    let before = d.clone();
    assert!(matches!(
        set(&mut d, &p("a.b.c"), 1.into()),
        Err(PathError::NotFound { .. })
    ));
    assert!(matches!(
        set(&mut d, &p("a.list[0]"), 1.into()),
        Err(PathError::NotFound { .. })
    ));
    assert_eq!(d, before);
}

#[test]
fn set_past_end_of_sequence_is_out_of_range() {
    let mut d = doc("l: [a]\n");
    assert!(matches!(
        set(&mut d, &p("l[1]"), "b".into()),
        Err(PathError::IndexOutOfRange { index: 1, len: 1, .. })
    ));
}

#[test]
fn root_mutations_are_rejected() {
    let mut d = doc("a: 1\n");
    assert_eq!(set(&mut d, &DocPath::root(), 1.into()), Err(PathError::EmptyPath));
    assert_eq!(delete(&mut d, &DocPath::root()), Err(PathError::EmptyPath));
}

#[test]
fn wrong_container_kind_is_explicit() {
    let mut d = doc("a: [1, 2]\ns: text\nm: {k: v}\n");
    match get(&d, &p("a.x")) {
        Err(PathError::WrongContainerKind { expected, found, path }) => {
            assert_eq!(expected, NodeKind::Mapping);
            assert_eq!(found, NodeKind::Sequence);
            assert_eq!(path, "a");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        get(&d, &p("m[0]")),
        Err(PathError::WrongContainerKind { expected: NodeKind::Sequence, found: NodeKind::Mapping, .. })
    ));
    assert!(matches!(
        set(&mut d, &p("s.inner"), 1.into()),
        Err(PathError::WrongContainerKind { found: NodeKind::String, .. })
    ));
}

#[test]
fn index_segments_on_non_sequences_fail_mutations() {
    let mut d = doc("a: [1, 2]\ns: text\nm: {k: v}\n");
    let before = serde_yaml::to_string(&d).unwrap();
    match delete(&mut d, &p("s[0]")) {
        Err(PathError::WrongContainerKind { expected, found, path }) => {
            assert_eq!((expected, found), (NodeKind::Sequence, NodeKind::String));
            assert_eq!(path, "s");
        }
        other => panic!("unexpected {other:?}"),
    }
    match set(&mut d, &p("m[0]"), 1.into()) {
        Err(PathError::WrongContainerKind { expected, found, path }) => {
            assert_eq!((expected, found), (NodeKind::Sequence, NodeKind::Mapping));
            assert_eq!(path, "m");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        delete(&mut d, &p("a.x")),
        Err(PathError::WrongContainerKind { expected: NodeKind::Mapping, found: NodeKind::Sequence, .. })
    ));
    assert!(matches!(
        set(&mut d, &p("s[0].x"), 1.into()),
        Err(PathError::WrongContainerKind { found: NodeKind::String, .. })
    ));
    assert_eq!(serde_yaml::to_string(&d).unwrap(), before);
}

#[test]
fn delete_then_read() {
    let mut d = doc("a:\n  b: 1\n  c: 2\n  d: 3\nl: [x, y, z]\n");
    let removed = delete(&mut d, &p("a.c")).unwrap();
    assert_eq!(removed, Document::from(2));
    assert!(matches!(get(&d, &p("a.c")), Err(PathError::NotFound { .. })));
    // remaining keys keep their order
    let keys: Vec<_> = d["a"].as_mapping().unwrap().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec![Document::from("b"), Document::from("d")]);

    delete(&mut d, &p("l[0]")).unwrap();
    assert_eq!(get(&d, &p("l[0]")).unwrap(), &Document::from("y"));
    assert!(matches!(
        delete(&mut d, &p("l[5]")),
        Err(PathError::IndexOutOfRange { index: 5, len: 2, .. })
    ));
    assert!(matches!(delete(&mut d, &p("a.zz")), Err(PathError::NotFound { .. })));
}

#[test]
fn append_failure_is_pure() {
    let mut d = doc("services:\n  web:\n    image: nginx\n    ports: ['80:80']\n");
    let before = serde_yaml::to_string(&d).unwrap();
    match append(&mut d, &p("services.web.image"), "x".into()) {
        Err(PathError::NotAList { found, .. }) => assert_eq!(found, NodeKind::String),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(serde_yaml::to_string(&d).unwrap(), before);

    append(&mut d, &p("services.web.ports"), "443:443".into()).unwrap();
    assert_eq!(get(&d, &p("services.web.ports[1]")).unwrap(), &Document::from("443:443"));
}

#[test]
fn numeric_keys_are_addressable_by_field() {
    let mut d = doc("ports:\n  8080: web\n");
    assert_eq!(get(&d, &p("ports.8080")).unwrap(), &Document::from("web"));
    set(&mut d, &p("ports.8080"), "api".into()).unwrap();
    assert_eq!(d["ports"].as_mapping().unwrap().len(), 1);
}

#[test]
fn undo_restores_state_before_last_mutation() {
    let mut s = EditSession::new(doc("a: {l: [1]}\n"));
    s.set("a.x", 1.into()).unwrap();
    s.append("a.l", 2.into()).unwrap();
    let before_last = s.working().clone();
    s.delete("a.x").unwrap();
    s.undo().unwrap();
    assert_eq!(s.working(), &before_last);
}

#[test]
fn original_is_never_mutated() {
    let original = doc("a: 1\n");
    let mut s = EditSession::new(original.clone());
    s.set("a", 2.into()).unwrap();
    s.set("b", 3.into()).unwrap();
    assert_eq!(s.original(), &original);
    let preview = s.preview();
    assert_eq!(preview.len(), 2);
    assert_eq!(s.original(), &original);
}

#[test]
fn parse_value_typing() {
    assert_eq!(parse_value("42"), Document::from(42));
    assert_eq!(parse_value("true"), Document::from(true));
    assert_eq!(parse_value("null"), Document::Null);
    assert_eq!(parse_value("always"), Document::from("always"));
    assert_eq!(parse_value("  spaced  "), Document::from("  spaced  "));
    assert_eq!(parse_value(" 42 "), Document::from(42));
    assert_eq!(parse_value("'007'"), Document::from("007"));
    assert_eq!(parse_value("8080:80"), Document::from("8080:80"));
    assert_eq!(parse_value("key: value"), Document::from("key: value"));
    assert_eq!(parse_value("# note"), Document::from("# note"));
    assert_eq!(parse_value("[a, b]"), doc("[a, b]"));
}

struct Scripted {
    actions: Vec<Action>,
    confirm_answers: Vec<bool>,
    reports: Vec<Report>,
    errors: Vec<SessionError>,
    previews: Vec<Vec<Change>>,
}

impl Scripted {
    fn new(actions: Vec<Action>, confirm_answers: Vec<bool>) -> Self {
        Self {
            actions: actions.into_iter().rev().collect(),
            confirm_answers: confirm_answers.into_iter().rev().collect(),
            reports: Vec::new(),
            errors: Vec::new(),
            previews: Vec::new(),
        }
    }
}

impl Frontend for Scripted {
    fn next_action(&mut self, _session: &EditSession) -> Action {
        self.actions.pop().unwrap_or(Action::Cancel)
    }
    fn confirm(&mut self, changes: &[Change]) -> bool {
        self.previews.push(changes.to_vec());
        self.confirm_answers.pop().unwrap_or(false)
    }
    fn report(&mut self, report: &Report) {
        self.reports.push(report.clone());
    }
    fn error(&mut self, err: &SessionError) {
        self.errors.push(err.clone());
    }
}

#[test]
fn run_commits_after_confirmed_preview() {
    let original = doc("services:\n  web:\n    image: nginx\n    ports: []\n");
    let mut fe = Scripted::new(
        vec![
            Action::Set {
                path: "services.web.restart".into(),
                value: "always".into(),
            },
            Action::Append {
                path: "services.web.ports".into(),
                value: "8080:80".into(),
            },
            Action::Set {
                path: "services.db.image".into(),
                value: "postgres".into(),
            },
            Action::ShowKeys { path: "services.web".into() },
            Action::Preview,
            Action::Undo,
            Action::Preview,
        ],
        vec![false, true],
    );
    let end = run(EditSession::new(original), &mut fe);
    // the undo dropped the append; the failed set left no snapshot behind
    let expected = doc("services:\n  web:\n    image: nginx\n    ports: []\n    restart: always\n");
    assert_eq!(end, SessionEnd::Committed(expected));
    assert_eq!(fe.errors.len(), 1);
    assert!(matches!(fe.errors[0], SessionError::Path(PathError::NotFound { .. })));
    assert_eq!(fe.previews.len(), 2);
    assert_eq!(fe.previews[0].len(), 2);
    assert_eq!(fe.previews[1].len(), 1);
    assert!(fe.reports.contains(&Report::NotSaved));
    assert!(fe.reports.iter().any(|r| matches!(r, Report::Keys { children, .. } if children.len() == 3)));
}

#[test]
fn run_cancel_discards_changes() {
    let mut fe = Scripted::new(
        vec![
            Action::Delete { path: "a".into() },
            Action::Cancel,
            Action::Undo,
        ],
        vec![],
    );
    let end = run(EditSession::new(doc("a: 1\n")), &mut fe);
    assert_eq!(end, SessionEnd::Cancelled);
    // nothing after the terminal state is consumed
    assert_eq!(fe.actions.len(), 1);
}

#[test]
fn load_save_keep_order_and_format() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("compose.yaml");
    let content = "version: '3'\nservices:\n  web:\n    image: nginx\n    ports:\n    - 80:80\n";
    std::fs::write(&src, content).unwrap();

    let d = craft_core::load(&src).unwrap().unwrap();
    let out = dir.path().join("nested/out.yaml");
    craft_core::save(&out, &d).unwrap();
    let first = std::fs::read_to_string(&out).unwrap();
    let reloaded = craft_core::load(&out).unwrap().unwrap();
    assert_eq!(reloaded, d);
    craft_core::save(&out, &reloaded).unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), first);
    let (v, sv) = (first.find("version:").unwrap(), first.find("services:").unwrap());
    assert!(v < sv);
    assert!(!first.contains('{'));

    let json = dir.path().join("out.json");
    craft_core::save(&json, &d).unwrap();
    assert_eq!(craft_core::load(&json).unwrap().unwrap(), d);
}

#[test]
fn empty_path_io_is_noop() {
    let p = std::path::Path::new("");
    assert!(craft_core::load(p).unwrap().is_none());
    craft_core::save(p, &doc("a: 1")).unwrap();
}

#[test]
fn empty_file_loads_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let f = dir.path().join("empty.yml");
    std::fs::write(&f, "\n").unwrap();
    assert_eq!(craft_core::load(&f).unwrap(), Some(Document::Null));
}

#[test]
fn find_documents_skips_hidden_dirs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("k8s")).unwrap();
    std::fs::create_dir_all(dir.path().join(".git")).unwrap();
    std::fs::write(dir.path().join("compose.yml"), "a: 1").unwrap();
    std::fs::write(dir.path().join("k8s/deploy.yaml"), "a: 1").unwrap();
    std::fs::write(dir.path().join(".git/config.yaml"), "a: 1").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
    let found = craft_core::find_documents(dir.path());
    assert_eq!(
        found,
        vec![dir.path().join("compose.yml"), dir.path().join("k8s/deploy.yaml")]
    );
}

#[test]
fn zip_backup_next_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let f = dir.path().join("kafka.yaml");
    std::fs::write(&f, "cluster: {}\n").unwrap();
    let zip = craft_core::zip_backup(&f).unwrap();
    assert!(zip.exists());
    assert_eq!(zip.parent(), Some(dir.path()));
    assert!(zip.file_name().unwrap().to_string_lossy().starts_with("kafka_"));
    assert!(craft_core::zip_backup(dir.path()).is_err());
}

#[test]
fn schema_templates_validate() {
    for kind in SchemaKind::ALL {
        kind.validate(&kind.default_structure()).unwrap();
    }
    assert_eq!(
        SchemaKind::DockerCompose.validate(&doc("version: '3'\n")),
        Err(SchemaError::MissingKey("services".into()))
    );
    assert!(matches!(
        SchemaKind::DockerCompose.validate(&doc("services: [a]\n")),
        Err(SchemaError::WrongShape { .. })
    ));
    assert_eq!(
        SchemaKind::Kafka.validate(&doc("cluster:\n  zookeeper: zk\n")),
        Err(SchemaError::MissingKey("cluster.brokers".into()))
    );
    assert_eq!(SchemaKind::Custom.validate(&doc("- a")), Err(SchemaError::NotAMapping));
    assert_eq!("k8s".parse::<SchemaKind>(), Ok(SchemaKind::Kubernetes));
    assert_eq!("Docker Compose".parse::<SchemaKind>(), Ok(SchemaKind::DockerCompose));
    assert!("helm".parse::<SchemaKind>().is_err());
}
