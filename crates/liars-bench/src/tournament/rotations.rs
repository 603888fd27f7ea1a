/// Cyclic seat orders: under rotation `r`, seat `i` is taken by agent `(i + offset) % n`.
pub struct SeatRotations {
    rotations: Vec<Vec<usize>>,
}

impl SeatRotations {
    /// `count` orders spread evenly over the `agents` distinct rotations.
    pub fn new(agents: usize, count: usize) -> Self {
        let limit = count.min(agents);
        let rotations = (0..limit)
            .map(|r| {
                let offset = r * agents / limit;
                (0..agents).map(|seat| (seat + offset) % agents).collect()
            })
            .collect();
        Self { rotations }
    }

    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.rotations
    }
}
