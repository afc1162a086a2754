pub mod src {
    pub mod parallel;
}

pub use src::parallel::*;
