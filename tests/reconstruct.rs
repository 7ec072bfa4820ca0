//! Tests for the full reconstruction pipeline
//!
//! Most point sets here are built from one or a few vertices per owner group
//! so the centroids are easy to work out by hand. The larger checks use
//! points from a small linear congruential generator so that runs are
//! repeatable without pulling in a random number crate.

use ahash::HashMapExt;
use log::info;
use nalgebra_glm as glm;
use skelform::{
    reconstruct, vertex, AssembledBone, DefaultAxis, DiagnosticKind, NameMap,
    ReconstructOptions, Reconstruction, RigError, RootSelection, SkError,
    SymmetryOptions, VertexRecord,
};
use std::sync::Once;

const EPSILON: f32 = 0.0005f32; // Small value for float comparisons
static INIT: Once = Once::new();

/// Initializes logging in a "once per test run" manner. Call at the start of
/// each test that needs logging.
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

fn close(a: &glm::Vec3, b: &glm::Vec3) -> bool {
    glm::distance(a, b) < EPSILON
}

/// Four vertices around `centre` whose mean is exactly `centre`
fn cluster(centre: [f32; 3], owner: u32) -> Vec<VertexRecord> {
    let c = glm::vec3(centre[0], centre[1], centre[2]);
    [
        glm::vec3(0.25, 0.0, 0.0),
        glm::vec3(-0.25, 0.0, 0.0),
        glm::vec3(0.0, 0.25, 0.0),
        glm::vec3(0.0, -0.25, 0.0),
    ]
    .iter()
    .map(|d| VertexRecord::new(c + d, owner))
    .collect()
}

fn lowest_owner() -> ReconstructOptions {
    ReconstructOptions {
        root_selection: RootSelection::LowestOwner,
        ..Default::default()
    }
}

fn bone(r: &Reconstruction, id: u32) -> &AssembledBone {
    r.bone_by_owner(id).unwrap()
}

/// Simple repeatable generator for test points
struct Lcg(u64);

impl Lcg {
    #[allow(clippy::cast_precision_loss)]
    fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 40) as f32 / (1u64 << 24) as f32).mul_add(2.0, -1.0)
    }

    fn points(&mut self, count: usize) -> Vec<glm::Vec3> {
        (0..count)
            .map(|_| {
                glm::vec3(self.next_f32(), self.next_f32(), self.next_f32())
            })
            .collect()
    }
}

fn one_vertex_each(points: &[glm::Vec3]) -> Vec<VertexRecord> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| VertexRecord::new(*p, u32::try_from(i).unwrap()))
        .collect()
}

/// Total edge length of the reconstructed tree, from bone heads
fn tree_length(r: &Reconstruction) -> f64 {
    r.bones
        .iter()
        .filter_map(|b| {
            b.parent_id
                .map(|p| f64::from(glm::distance(&b.head, &bone(r, p).head)))
        })
        .sum()
}

/// Edges of the tree encoded by a Prüfer sequence
fn prufer_edges(seq: &[usize], n: usize) -> Vec<(usize, usize)> {
    let mut degree = vec![1; n];
    for &s in seq {
        degree[s] += 1;
    }
    let mut edges = Vec::with_capacity(n - 1);
    for &s in seq {
        let leaf = (0..n).find(|&i| degree[i] == 1).unwrap();
        edges.push((leaf, s));
        degree[leaf] -= 1;
        degree[s] -= 1;
    }
    let rest: Vec<_> = (0..n).filter(|&i| degree[i] == 1).collect();
    edges.push((rest[0], rest[1]));
    edges
}

/// Minimum spanning tree weight found by trying every labelled tree
fn brute_force_mst(points: &[glm::Vec3]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let len = n - 2;
    let total = n.pow(u32::try_from(len).unwrap());
    let mut best = f64::INFINITY;
    let mut seq = vec![0; len];
    for code in 0..total {
        let mut c = code;
        for s in &mut seq {
            *s = c % n;
            c /= n;
        }
        let weight: f64 = prufer_edges(&seq, n)
            .iter()
            .map(|&(a, b)| f64::from(glm::distance(&points[a], &points[b])))
            .sum();
        best = best.min(weight);
    }
    best
}

/// Checks the structural properties every output must have
fn check_structure(r: &Reconstruction, groups: usize) {
    assert_eq!(r.bones.len(), groups);
    assert_eq!(r.bones.iter().filter(|b| b.parent_id.is_none()).count(), 1);
    for (i, b) in r.bones.iter().enumerate() {
        if let Some(parent) = b.parent_id {
            let p = r.bones.iter().position(|x| x.id == parent);
            assert!(p.is_some_and(|p| p < i), "bone {} before parent", b.id);
        }
        assert!(b.length() > 0.0, "bone {} has zero length", b.id);
    }
}

/// One group of three vertices gives a single bone along the default axis
#[test]
fn single_group() {
    init_tests();
    let vertices = [
        VertexRecord::new(glm::vec3(0.0, 0.0, 0.0), 0),
        VertexRecord::new(glm::vec3(2.0, 0.0, 0.0), 0),
        VertexRecord::new(glm::vec3(1.0, 0.0, 2.0), 0),
    ];
    let r = reconstruct(
        &vertices,
        &NameMap::new(),
        &ReconstructOptions::default(),
    )
    .unwrap();
    info!("single_group {:?}", r);
    check_structure(&r, 1);

    let root = r.root().unwrap();
    assert!(close(&root.head, &glm::vec3(1.0, 0.0, 0.6667)));
    assert!(close(&root.tail, &glm::vec3(1.0, 0.05, 0.6667)));
    assert!(!root.connected_to_parent);
}

/// Three groups along a bent line with the lowest owner as root form a
/// chain where every link is connected
#[test]
fn chain() {
    init_tests();
    let vertices = [
        cluster([0.0, 0.0, 0.0], 0),
        cluster([0.0, 0.0, 2.0], 1),
        cluster([0.0, 2.0, 2.0], 2),
    ]
    .concat();
    let r = reconstruct(&vertices, &NameMap::new(), &lowest_owner()).unwrap();
    check_structure(&r, 3);

    assert_eq!(bone(&r, 0).parent_id, None);
    assert_eq!(bone(&r, 1).parent_id, Some(0));
    assert_eq!(bone(&r, 2).parent_id, Some(1));
    assert!(!bone(&r, 0).connected_to_parent);
    assert!(bone(&r, 1).connected_to_parent);
    assert!(bone(&r, 2).connected_to_parent);

    // Tails meet the next head along the chain
    assert!(close(&bone(&r, 0).tail, &bone(&r, 1).head));
    assert!(close(&bone(&r, 1).tail, &bone(&r, 2).head));
    assert!((tree_length(&r) - 4.0).abs() < 1.0e-4);
    assert!(!r.is_degraded());
}

/// The same chain with the default root rule is rooted at its middle group,
/// which then branches
#[test]
fn chain_center_most() {
    let vertices = [
        cluster([0.0, 0.0, 0.0], 0),
        cluster([0.0, 0.0, 2.0], 1),
        cluster([0.0, 2.0, 2.0], 2),
    ]
    .concat();
    let r = reconstruct(
        &vertices,
        &NameMap::new(),
        &ReconstructOptions::default(),
    )
    .unwrap();
    check_structure(&r, 3);
    assert_eq!(r.root().map(|b| b.id), Some(1));
    assert_eq!(r.children_of(1).count(), 2);
    assert!(!bone(&r, 0).connected_to_parent);
    assert!(!bone(&r, 2).connected_to_parent);
    // Owner 0 was attached first on an equal distance
    assert!(close(&bone(&r, 1).tail, &bone(&r, 0).head));
    assert!((tree_length(&r) - 4.0).abs() < 1.0e-4);
}

/// Two groups at equal distance below a centre group, kept apart by the
/// symmetry penalty, both hang off the centre without being connected
#[test]
fn branch() {
    init_tests();
    let vertices = [
        cluster([0.0, 0.0, 0.0], 0),
        cluster([-1.0, 0.0, -2.0], 1),
        cluster([1.0, 0.0, -2.0], 2),
    ]
    .concat();
    let options = ReconstructOptions {
        symmetry: Some(SymmetryOptions::default()),
        ..lowest_owner()
    };
    let r = reconstruct(&vertices, &NameMap::new(), &options).unwrap();
    check_structure(&r, 3);

    assert_eq!(bone(&r, 1).parent_id, Some(0));
    assert_eq!(bone(&r, 2).parent_id, Some(0));
    assert!(!bone(&r, 1).connected_to_parent);
    assert!(!bone(&r, 2).connected_to_parent);
    assert!(close(&bone(&r, 0).tail, &bone(&r, 1).head));
    let expected = 2.0 * 5.0f64.sqrt();
    assert!((tree_length(&r) - expected).abs() < 1.0e-4);
}

/// Owners with no vertices or no weight never show up as bones
#[test]
fn empty_groups_are_absent() {
    init_tests();
    let mut vertices =
        [cluster([0.0, 0.0, 0.0], 0), cluster([0.0, 0.0, 1.0], 1)].concat();
    vertices.push(VertexRecord::weighted(glm::vec3(5.0, 5.0, 5.0), 3, 0.0));
    let mut names = NameMap::new();
    names.insert(0, "Body".to_string());
    names.insert(1, "Neck".to_string());
    names.insert(5, "Tail".to_string());

    let r = reconstruct(&vertices, &names, &ReconstructOptions::default())
        .unwrap();
    check_structure(&r, 2);
    assert!(r.bone_by_owner(3).is_none());
    assert!(r.bone_by_owner(5).is_none());
    assert!(r.is_degraded());

    let kinds: Vec<_> = r.diagnostics.iter().map(|d| d.kind.clone()).collect();
    assert!(kinds.contains(&DiagnosticKind::PartialGroup {
        owner: 3,
        vertex_count: 1
    }));
    assert!(kinds.contains(&DiagnosticKind::PartialGroup {
        owner: 5,
        vertex_count: 0
    }));
    assert!(r.diagnostics.iter().all(|d| !d.is_fatal()));
    assert_eq!(bone(&r, 1).name, "Neck");
}

/// When only one group survives the filter the lone root rule applies
#[test]
fn one_usable_group() {
    let vertices = [
        VertexRecord::weighted(glm::vec3(0.0, 0.0, 0.0), 0, 0.0),
        VertexRecord::new(glm::vec3(3.0, 0.0, 0.0), 1),
    ];
    let options = ReconstructOptions {
        default_axis: DefaultAxis::Fixed(glm::vec3(0.0, 0.0, 1.0)),
        ..Default::default()
    };
    let r = reconstruct(&vertices, &NameMap::new(), &options).unwrap();
    check_structure(&r, 1);
    let root = r.root().unwrap();
    assert_eq!(root.id, 1);
    assert!(close(&root.tail, &glm::vec3(3.0, 0.0, 0.05)));
    assert!(r.is_degraded());
}

#[test]
fn empty_input() {
    init_tests();
    let options = ReconstructOptions::default();
    let result = reconstruct(&[], &NameMap::new(), &options);
    let Err(SkError::RigError(e)) = result else {
        unreachable!("empty input must fail");
    };
    assert_eq!(e, RigError::EmptyInput { skipped: vec![] });
    let d = e.diagnostic().unwrap();
    assert!(d.is_fatal());
    assert_eq!(d.kind, DiagnosticKind::EmptyInput { skipped: 0 });

    // Names alone are not vertices
    let mut names = NameMap::new();
    names.insert(0, "Body".to_string());
    let result = reconstruct(&[], &names, &ReconstructOptions::default());
    assert!(matches!(
        result,
        Err(SkError::RigError(RigError::EmptyInput { ref skipped }))
            if skipped.is_empty()
    ));
}

/// Vertices that all carry zero weight count as empty input, and the
/// skipped groups are still reported
#[test]
fn zero_weight_input_is_empty() {
    init_tests();
    let options = ReconstructOptions::default();
    let single = [VertexRecord::weighted(glm::vec3(0.0, 0.0, 0.0), 0, 0.0)];
    let result = reconstruct(&single, &NameMap::new(), &options);
    assert!(matches!(
        result,
        Err(SkError::RigError(RigError::EmptyInput { .. }))
    ));

    let vertices = [
        VertexRecord::weighted(glm::vec3(0.0, 0.0, 0.0), 0, 0.0),
        VertexRecord::weighted(glm::vec3(1.0, 0.0, 0.0), 4, 0.0),
    ];
    let Err(SkError::RigError(e)) =
        reconstruct(&vertices, &NameMap::new(), &options)
    else {
        unreachable!("zero weight input must fail");
    };
    let kinds: Vec<_> = e.diagnostics().into_iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            DiagnosticKind::PartialGroup {
                owner: 0,
                vertex_count: 1
            },
            DiagnosticKind::PartialGroup {
                owner: 4,
                vertex_count: 1
            },
            DiagnosticKind::EmptyInput { skipped: 2 },
        ]
    );
}

#[test]
fn invalid_options() {
    let vertices = cluster([0.0, 0.0, 0.0], 0);
    let options = ReconstructOptions {
        leaf_tail_fraction: -0.5,
        ..Default::default()
    };
    let result = reconstruct(&vertices, &NameMap::new(), &options);
    assert!(matches!(
        result,
        Err(SkError::RigError(RigError::InvalidOptions("leaf_tail_fraction")))
    ));
}

/// Two groups on the same spot still give bones with length
#[test]
fn coincident_groups() {
    let vertices = [cluster([1.0, 1.0, 1.0], 0), cluster([1.0, 1.0, 1.0], 1)]
        .concat();
    let r = reconstruct(&vertices, &NameMap::new(), &lowest_owner()).unwrap();
    check_structure(&r, 2);
    assert!(r
        .diagnostics
        .iter()
        .any(|d| matches!(d.kind, DiagnosticKind::DegenerateGeometry { .. })));
}

/// Total tree length matches the best tree found by brute force
#[test]
fn minimum_spanning_tree() {
    init_tests();
    let mut lcg = Lcg(0x5eed);
    for n in 1..=8 {
        let rounds = if n == 8 { 2 } else { 4 };
        for _ in 0..rounds {
            let points = lcg.points(n);
            let r = reconstruct(
                &one_vertex_each(&points),
                &NameMap::new(),
                &ReconstructOptions::default(),
            )
            .unwrap();
            check_structure(&r, n);
            let expected = brute_force_mst(&points);
            let got = tree_length(&r);
            info!("n={} mst={} got={}", n, expected, got);
            assert!((got - expected).abs() < 1.0e-4, "n={n}");
        }
    }
}

/// Equal inputs give bit for bit equal outputs
#[test]
fn deterministic() {
    let mut lcg = Lcg(42);
    let mut vertices = Vec::new();
    for (owner, centre) in lcg.points(24).iter().enumerate() {
        let owner = u32::try_from(owner).unwrap();
        for offset in lcg.points(10) {
            vertices.push(VertexRecord::new(centre + offset * 0.1, owner));
        }
    }
    let names: NameMap =
        (0..24).map(|i| (i, format!("Group{i}"))).collect();
    let options = ReconstructOptions::default();

    let first = reconstruct(&vertices, &names, &options).unwrap();
    let second = reconstruct(&vertices, &names, &options).unwrap();
    check_structure(&first, 24);
    assert_eq!(first, second);
    for (a, b) in first.bones.iter().zip(&second.bones) {
        for (x, y) in a.head.iter().chain(a.tail.iter()).zip(
            b.head.iter().chain(b.tail.iter()),
        ) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
    let a = serde_yaml::to_string(&first).unwrap();
    let b = serde_yaml::to_string(&second).unwrap();
    assert_eq!(a, b);
}

/// Calls on different threads with their own inputs do not interact
#[test]
fn independent_calls() {
    let mut lcg = Lcg(7);
    let a = one_vertex_each(&lcg.points(12));
    let b = one_vertex_each(&lcg.points(5));
    let options = ReconstructOptions::default();
    let names = NameMap::new();
    let expected_a = reconstruct(&a, &names, &options).unwrap();
    let expected_b = reconstruct(&b, &names, &options).unwrap();

    std::thread::scope(|s| {
        let ha = s.spawn(|| reconstruct(&a, &names, &options).unwrap());
        let hb = s.spawn(|| reconstruct(&b, &names, &options).unwrap());
        assert_eq!(ha.join().unwrap(), expected_a);
        assert_eq!(hb.join().unwrap(), expected_b);
    });
}

/// Multi-influence vertices feed the weighted centroid rule
#[test]
fn skinned_vertices() {
    let mut vertices = Vec::new();
    vertices.extend(vertex::expand_skinned(
        glm::vec3(0.0, 0.0, 0.0),
        [0, 1, 0, 0],
        [0.5, 0.5, 0.0, 0.0],
    ));
    vertices.extend(vertex::expand_skinned(
        glm::vec3(0.0, 0.0, 4.0),
        [1, 0, 0, 0],
        [1.5, 0.0, 0.0, 0.0],
    ));
    vertices.extend(vertex::expand_skinned(
        glm::vec3(0.0, 0.0, -1.0),
        [0, 0, 0, 0],
        [1.0, 0.0, 0.0, 0.0],
    ));
    let r = reconstruct(&vertices, &NameMap::new(), &lowest_owner()).unwrap();
    check_structure(&r, 2);
    // Owner 0: (0 * 0.5 + -1 * 1.0) / 1.5, owner 1: (0 * 0.5 + 4 * 1.5) / 2
    assert!(close(&bone(&r, 0).head, &glm::vec3(0.0, 0.0, -0.6667)));
    assert!(close(&bone(&r, 1).head, &glm::vec3(0.0, 0.0, 3.0)));
}

/// Offset owner numbering with generated names, as in formats that carry
/// no names at all
#[test]
fn offset_owners_and_generated_names() {
    let raw = [cluster([0.0, 0.0, 0.0], 3), cluster([0.0, 0.0, 1.0], 4)]
        .concat();
    let (records, diagnostic) = vertex::normalize_owner_offset(&raw);
    assert_eq!(
        diagnostic.map(|d| d.kind),
        Some(DiagnosticKind::OwnerOffset { offset: 3 })
    );
    let names = vertex::default_names(&records, 3, "CarBone");
    let r = reconstruct(&records, &names, &lowest_owner()).unwrap();
    check_structure(&r, 2);
    assert_eq!(bone(&r, 0).name, "CarBone_3");
    assert_eq!(bone(&r, 1).name, "CarBone_4");
    assert!(!r.is_degraded());
}

/// The default axis can come from the mesh shape
#[test]
fn model_forward_axis() {
    let vertices = [
        VertexRecord::new(glm::vec3(-4.0, 0.0, 0.0), 0),
        VertexRecord::new(glm::vec3(-3.8, 0.2, 0.0), 0),
        VertexRecord::new(glm::vec3(-3.8, -0.2, 0.0), 0),
        VertexRecord::new(glm::vec3(4.0, 0.0, 0.0), 0),
    ];
    let options = ReconstructOptions {
        default_axis: DefaultAxis::ModelForward,
        ..Default::default()
    };
    let r = reconstruct(&vertices, &NameMap::new(), &options).unwrap();
    let root = r.root().unwrap();
    let dir = glm::normalize(&(root.tail - root.head));
    assert!(close(&dir, &glm::vec3(-1.0, 0.0, 0.0)));
}

#[test]
fn options_from_file() {
    let path = std::env::temp_dir().join("skelform_options_test.yaml");
    std::fs::write(
        &path,
        "min_bone_length: 0.02\nroot_selection: LowestOwner\n",
    )
    .unwrap();
    let options = ReconstructOptions::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!((options.min_bone_length - 0.02).abs() < EPSILON);
    assert_eq!(options.root_selection, RootSelection::LowestOwner);

    let missing = ReconstructOptions::load(path);
    assert!(matches!(missing, Err(SkError::StdIoError(_))));
}
