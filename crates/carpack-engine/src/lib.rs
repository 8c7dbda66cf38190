//! CAR generation pipeline: enumeration, slicing, DAG assembly, CAR
//! emission, manifest recording, and extraction.
//!
//! The pipeline flows enumerate → plan → assemble → write → record:
//! input paths become [`FileRef`](carpack_types::FileRef) sequences,
//! the slice planner partitions them under the byte budget, each slice's
//! UnixFS DAG is assembled into an ephemeral block store, serialized as a
//! CAR v1 stream named `<root cid>.car`, and summarized into one
//! `manifest.csv` row.
//!
//! Entry points: [`CarGenerator`] (or the free functions
//! [`generate_car_from_files`], [`generate_car_from_files_with_uuid`],
//! [`generate_car_from_dir`]) for building, [`list_car_file`] /
//! [`get_car_root`] for inspection, and [`car_to_files`] /
//! [`extract_file_from_car`] / [`merge_sliced_files`] for round-tripping.

pub mod assembler;
pub mod enumerate;
pub mod error;
pub mod extract;
pub mod generator;
pub mod list;
pub mod manifest;
pub mod planner;
pub mod summary;

pub use assembler::{DagAssembler, SliceDag};
pub use enumerate::{enumerate_files_with_uuids, enumerate_paths};
pub use error::EngineError;
pub use extract::{car_to_files, extract_file_from_car, merge_sliced_files};
pub use generator::{
    CarGenerator, generate_car_from_dir, generate_car_from_files,
    generate_car_from_files_with_uuid,
};
pub use list::{CarFileInfo, get_car_root, list_car_file};
pub use planner::{GraphSlice, plan_slices};
pub use summary::summarize;
