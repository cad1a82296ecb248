pub mod answer_key;
pub mod evaluation;
pub mod item;
pub mod loaders;
pub mod stage;

pub use answer_key::{AnswerKey, CanonicalAnswer};
pub use evaluation::{Evaluation, WorkerId};
pub use item::{Item, ItemId};
pub use loaders::{load_static_assets, StaticAssets};
pub use stage::IntroStage;
