pub use enclose::*;

#[macro_export]
macro_rules! computed {
    (( $($c_tt:tt)* ) $($b:tt)*) => {
        $crate::Computed::new($crate::macros::enclose!(($( $c_tt )*) Box::new(move || { $($b)* })))
    };
    ($($b:tt)*) => {
        $crate::Computed::new(Box::new(move || { $($b)* }))
    };
}

#[macro_export]
macro_rules! effect {
    (( $($c_tt:tt)* ) $($b:tt)*) => {
        $crate::Effect::new($crate::macros::enclose!(($( $c_tt )*) Box::new(move || { $($b)* })))
    };
    ($($b:tt)*) => {
        $crate::Effect::new(Box::new(move || { $($b)* }))
    };
}
