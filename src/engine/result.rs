use serde::Serialize;

/// One pattern match: absolute address, buffer offset and the decoded value
/// (raw address, dereferenced pointer, resolved reference or static constant
/// depending on the pattern's output mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub address: u32,
    pub offset: u32,
    pub value: u32,
}

/// How an instruction refers to the searched address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum XRefKind {
    /// PC-relative load whose loaded pointer equals the address.
    Pointer,
    /// PC-relative load whose literal pool slot is the address.
    Reference,
    /// Branch or call targeting the address.
    BranchCall,
}

impl XRefKind {
    pub fn tag(self) -> &'static str {
        match self {
            XRefKind::Pointer => "pointer",
            XRefKind::Reference => "reference",
            XRefKind::BranchCall => "branch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XRefResult {
    #[serde(rename = "type")]
    pub kind: XRefKind,
    pub address: u32,
    pub offset: u32,
}
