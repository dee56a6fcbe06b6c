mod error;
mod nominatim;
mod openai_compatible;
mod prokerala;

pub use error::{ProviderError, ProviderErrorKind};
pub use nominatim::NominatimResolver;
pub use openai_compatible::OpenAiCompatibleProvider;
pub use prokerala::ProkeralaChartProvider;
