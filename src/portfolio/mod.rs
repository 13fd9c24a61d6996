mod holding;

pub use holding::*;

#[derive(Debug, Default)]
pub struct Portfolio {
    pub name: String,
    pub records: Vec<HoldingRecord>,
}

impl Portfolio {
    pub fn new<N: Into<String>>(name: N, records: Vec<HoldingRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}
