pub mod codegen;
pub mod index;
pub mod issues;
pub mod lottie;
pub mod model;
pub mod name;
pub mod optimize;
pub mod parser;
pub mod serializer;
pub mod simplify;
pub mod translate;

pub use codegen::{CodegenConfiguration, generate};
pub use index::{GraphIndex, InRef, InRefKind};
pub use issues::{Issue, IssueSeverity, Issues};
pub use lottie::LottieComposition;
pub use model::*;
pub use name::PropName;
pub use optimize::optimize;
pub use parser::parse;
pub use serializer::to_yaml;
pub use simplify::simplify_properties;
pub use translate::translate;
