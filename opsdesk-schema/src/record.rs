use serde::{Serialize, de::DeserializeOwned};

/// A row type owned by one backend table.
///
/// Rows travel through the data-access layer as JSON objects; implementors
/// describe which table they decode from and expose their primary key.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($ty:ty, $table:literal) => {
        impl $crate::record::Record for $ty {
            const TABLE: &'static str = $table;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

pub(crate) use impl_record;
