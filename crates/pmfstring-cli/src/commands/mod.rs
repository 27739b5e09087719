pub mod inspect;
pub mod relax;
