//! Demo of skeleton reconstruction using skelform
//!
//! Builds a small four legged creature out of owner tagged vertex clusters,
//! reconstructs its skeleton and prints the result as YAML. An options file
//! can be given as the first argument.
use ahash::HashMapExt;
use log::{error, info};
use nalgebra_glm as glm;
use skelform::{reconstruct, NameMap, ReconstructOptions, VertexRecord};

const VERTICES_PER_PART: u32 = 24;
const PART_RADIUS: f32 = 0.08;

/// Name and centre of each body part, Z up, facing +Y
const PARTS: [(&str, [f32; 3]); 11] = [
    ("Pelvis", [0.0, 0.0, 1.0]),
    ("Spine", [0.0, 0.6, 1.05]),
    ("Neck", [0.0, 1.1, 1.3]),
    ("Head", [0.0, 1.4, 1.5]),
    ("Tail", [0.0, -0.5, 1.0]),
    ("Thigh_L", [-0.3, 0.0, 0.5]),
    ("Thigh_R", [0.3, 0.0, 0.5]),
    ("Foot_L", [-0.3, 0.05, 0.05]),
    ("Foot_R", [0.3, 0.05, 0.05]),
    ("Arm_L", [-0.3, 0.7, 0.5]),
    ("Arm_R", [0.3, 0.7, 0.5]),
];

#[allow(clippy::cast_precision_loss)]
fn creature() -> (Vec<VertexRecord>, NameMap) {
    let mut vertices = Vec::new();
    let mut names = NameMap::new();
    for (owner, (name, centre)) in (0u32..).zip(PARTS) {
        names.insert(owner, name.to_string());
        let centre = glm::vec3(centre[0], centre[1], centre[2]);
        for i in 0..VERTICES_PER_PART {
            let a = i as f32 / VERTICES_PER_PART as f32 * std::f32::consts::TAU;
            let ring =
                glm::vec3(a.cos(), a.sin(), (a * 3.0).sin()) * PART_RADIUS;
            vertices.push(VertexRecord::new(centre + ring, owner));
        }
    }
    (vertices, names)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let options = if args.len() < 2 {
        ReconstructOptions::default()
    } else {
        match ReconstructOptions::load(&args[1]) {
            Ok(options) => options,
            Err(e) => {
                error!("could not load {}: {}", args[1], e);
                return;
            }
        }
    };

    let (vertices, names) = creature();
    match reconstruct(&vertices, &names, &options) {
        Ok(result) => {
            for d in &result.diagnostics {
                info!("{}", d);
            }
            match serde_yaml::to_string(&result.bones) {
                Ok(text) => println!("{text}"),
                Err(e) => error!("could not write bones: {}", e),
            }
        }
        Err(e) => error!("reconstruction failed: {}", e),
    }
}
