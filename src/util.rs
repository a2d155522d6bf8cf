/// Returns early with [`Error::InvalidArgument`](crate::Error::InvalidArgument) if a numerical
/// value is outside the provided interval
///
/// The closed form checks `[a,b]`, the `> a` form checks `(a,b]`. NaN never passes.
///
/// ### Example
/// ```ignore
/// ensure_interval!(gamma = config.discount_factor, 0.0, 1.0);
/// ensure_interval!(alpha = config.learning_rate, > 0.0, 1.0);
/// ```
macro_rules! ensure_interval {
    ($name:ident = $var:expr, > $a:expr, $b:expr) => {
        let value: f64 = $var;
        if !(value > $a && value <= $b) {
            return Err($crate::Error::InvalidArgument {
                name: stringify!($name),
                value,
                reason: concat!("must be in the interval (", stringify!($a), ", ", stringify!($b), "]"),
            });
        }
    };
    ($name:ident = $var:expr, $a:expr, $b:expr) => {
        let value: f64 = $var;
        if !(value >= $a && value <= $b) {
            return Err($crate::Error::InvalidArgument {
                name: stringify!($name),
                value,
                reason: concat!("must be in the interval [", stringify!($a), ", ", stringify!($b), "]"),
            });
        }
    };
}

pub(crate) use ensure_interval;
