mod board;
mod desk;
mod execute;
mod form;

pub use board::*;
pub use desk::RuleDesk;
pub use execute::*;
pub use form::*;

/// 纯函数式状态转换
pub trait Reducer: Default {
    type Action;

    fn reduce(self, action: Self::Action) -> Self;
}

pub fn dispatch<S: Reducer>(state: &mut S, action: S::Action) {
    let current = std::mem::take(state);
    *state = current.reduce(action);
}
