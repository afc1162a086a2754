pub mod src {
    pub mod position_map;
    pub mod source_map;
}

pub use src::position_map::*;
pub use src::source_map::*;

#[cfg(test)]
mod test;
