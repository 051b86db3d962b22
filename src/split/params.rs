/// Which dimensions a split search is allowed to try.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateDimsParams {
    All,
    /// At most `max_dims` dimensions per node, drawn reproducibly from `seed`
    /// and the node's position in the tree.
    Random { max_dims: usize, seed: u64 },
}

impl Default for CandidateDimsParams {
    fn default() -> Self {
        CandidateDimsParams::All
    }
}
