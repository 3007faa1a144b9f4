//! Integration tests for solver collections exported through a job.

use abc_bullet::archive::{ArchiveDocument, ArchiveWriter, OArchive, PropertyValue};
use abc_bullet::core::FrameRange;
use abc_bullet::export::{ExportJob, JobArgs, RecordingEvaluator, STATISTICS_PROPERTY, XFORM_PROPERTY};
use abc_bullet::scene::{AttrKey, AttrValue, MemoryScene, NodeDesc, SceneDesc, SolvedDesc, TrsKey};
use abc_bullet::util::{translation_of, DVec3, DagPath};

use tempfile::TempDir;

fn solved_until(path: &str, frame: f64) -> SolvedDesc {
    SolvedDesc {
        until: Some(frame),
        ..SolvedDesc::new(path, Vec::new())
    }
}

fn scene() -> MemoryScene {
    let desc = SceneDesc {
        nodes: vec![
            NodeDesc::transform("sim")
                .with_translate([0.0, 1.0, 0.0])
                .with_children(vec![
                    NodeDesc::transform("a"),
                    NodeDesc::transform("b"),
                    NodeDesc::transform("c"),
                ]),
            NodeDesc::collection(
                "solver",
                vec![
                    SolvedDesc::new(
                        "|sim|a",
                        vec![
                            TrsKey::translate(1.0, [0.0, 1.0, 0.0]),
                            TrsKey::translate(3.0, [0.0, 5.0, 0.0]),
                        ],
                    ),
                    solved_until("|sim|b", 1.0),
                    solved_until("|sim|c", 1.0),
                ],
            )
            .intermediate()
            .with_attribute(
                "mass",
                AttrValue::Double(1.0),
                vec![AttrKey { frame: 1.0, value: 1.0 }, AttrKey { frame: 3.0, value: 3.0 }],
            ),
        ],
        ..SceneDesc::default()
    };
    MemoryScene::from_desc(desc).expect("valid scene")
}

fn run(dir: &TempDir, sc: &mut MemoryScene, configure: impl FnOnce(&mut JobArgs)) -> ExportJob<OArchive> {
    let mut args = JobArgs::new(dir.path().join("out.json"));
    args.dag_paths = vec![DagPath::parse("|solver")];
    args.frame_range = FrameRange::new(1.0, 3.0);
    args.verbose = true;
    configure(&mut args);

    let mut job: ExportJob<OArchive> = ExportJob::from_args(args).expect("valid args");
    let mut ev = RecordingEvaluator::new();
    let frames: Vec<f64> = job.frames().iter().collect();
    for frame in frames {
        sc.set_frame(frame);
        job.eval(frame, sc, &mut ev).expect("eval");
    }
    job
}

fn sample_count(ar: &OArchive, path: &str, prop: &str) -> usize {
    let obj = ar.find(path).unwrap_or_else(|| panic!("{path} missing"));
    let prop = ar.property_by_name(obj, prop).expect("property");
    ar.samples(prop).len()
}

#[test]
fn test_leaves_under_materialized_ancestors() {
    let dir = TempDir::new().expect("temp dir");
    let mut sc = scene();
    let job = run(&dir, &mut sc, |_| {});
    let ar = job.archive().expect("archive");

    // Ancestors of leaves are static transforms; leaves are always sampled.
    assert_eq!(sample_count(ar, "/sim", XFORM_PROPERTY), 1);
    assert_eq!(sample_count(ar, "/sim/a", XFORM_PROPERTY), 3);
    assert!(ar.find("/solver").is_none());

    // Ancestors created for leaves are not counted.
    assert_eq!(job.statistics().map(|s| s.summary()), Some("TransColNum 1 ".to_string()));
}

#[test]
fn test_leaf_matrix_is_relative_to_parent() {
    let dir = TempDir::new().expect("temp dir");
    let mut sc = scene();
    let job = run(&dir, &mut sc, |_| {});
    let ar = job.archive().expect("archive");

    let obj = ar.find("/sim/a").expect("leaf");
    let prop = ar.property_by_name(obj, XFORM_PROPERTY).expect("xform");
    let ys: Vec<f64> = ar
        .samples(prop)
        .iter()
        .map(|v| match v {
            PropertyValue::Matrix44d(m) => translation_of(m).y,
            other => panic!("unexpected sample {other:?}"),
        })
        .collect();
    assert_eq!(ys, vec![0.0, 2.0, 4.0]);

    // Only the live leaf contributes to the bounds.
    let bounds = job.bounds();
    assert_eq!(bounds.min, DVec3::new(0.0, 5.0, 0.0));
    assert_eq!(bounds.max, DVec3::new(0.0, 5.0, 0.0));
}

#[test]
fn test_shrinking_solver_output() {
    let dir = TempDir::new().expect("temp dir");
    let mut sc = scene();
    let job = run(&dir, &mut sc, |_| {});
    let ar = job.archive().expect("archive");

    // b and c leave the solver after frame 1 and keep their setup sample.
    assert_eq!(sample_count(ar, "/sim/b", XFORM_PROPERTY), 1);
    assert_eq!(sample_count(ar, "/sim/c", XFORM_PROPERTY), 1);
    assert_eq!(sample_count(ar, "/sim/a", XFORM_PROPERTY), 3);
}

#[test]
fn test_shrink_between_frames() {
    let dir = TempDir::new().expect("temp dir");
    let desc = SceneDesc {
        nodes: vec![
            NodeDesc::transform("p").with_children(vec![NodeDesc::transform("x"), NodeDesc::transform("y")]),
            NodeDesc::collection(
                "solver",
                vec![SolvedDesc::new("|p|x", Vec::new()), SolvedDesc::new("|p|y", Vec::new())],
            ),
        ],
        ..SceneDesc::default()
    };
    let mut sc = MemoryScene::from_desc(desc).expect("valid scene");

    let mut args = JobArgs::new(dir.path().join("out.json"));
    args.dag_paths = vec![DagPath::parse("|solver")];
    args.frame_range = FrameRange::new(1.0, 3.0);
    let mut job: ExportJob<OArchive> = ExportJob::from_args(args).expect("valid args");
    let mut ev = RecordingEvaluator::new();

    sc.set_frame(1.0);
    job.eval(1.0, &sc, &mut ev).expect("setup");
    sc.solved_mut(&DagPath::parse("|solver")).expect("collection").truncate(1);
    for frame in [2.0, 3.0] {
        sc.set_frame(frame);
        job.eval(frame, &sc, &mut ev).expect("sample");
    }

    let ar = job.archive().expect("archive");
    assert_eq!(sample_count(ar, "/p/x", XFORM_PROPERTY), 3);
    assert_eq!(sample_count(ar, "/p/y", XFORM_PROPERTY), 1);
}

#[test]
fn test_solver_attributes_on_top() {
    let dir = TempDir::new().expect("temp dir");
    let mut sc = scene();
    let job = run(&dir, &mut sc, |args| args.attributes = vec!["mass".to_string()]);
    let ar = job.archive().expect("archive");

    let prop = ar.property_by_name(ar.top(), "solver.mass").expect("solver attribute");
    assert_eq!(
        ar.samples(prop),
        &[
            PropertyValue::Float64(1.0),
            PropertyValue::Float64(2.0),
            PropertyValue::Float64(3.0)
        ]
    );
    assert_eq!(ar.property_time_sampling(prop), Some(job.time_sampling_index()));
}

#[test]
fn test_unresolvable_collection_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let desc = SceneDesc {
        nodes: vec![NodeDesc::collection(
            "solver",
            vec![SolvedDesc::new("|gone", Vec::new())],
        )],
        ..SceneDesc::default()
    };
    let mut sc = MemoryScene::from_desc(desc).expect("valid scene");
    let job = run(&dir, &mut sc, |_| {});

    assert_eq!(job.statistics().map(|s| s.trans_col_num), Some(0));
    drop(job);

    let doc = ArchiveDocument::open(dir.path().join("out.json")).expect("archive written");
    assert!(doc.root.children.is_empty());
    assert!(doc.root.property(STATISTICS_PROPERTY).is_none());
}
