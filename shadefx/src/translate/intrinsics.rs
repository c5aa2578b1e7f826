use crate::types::DataType;

/// Built-in functions callable from shader code, either as free functions
/// (`sin(x)`) or as methods on their first argument (`x.sin()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Abs,
    Acos,
    All,
    Any,
    Asin,
    Atan,
    Atan2,
    Ceil,
    Clamp,
    Cos,
    Cross,
    Ddx,
    Ddy,
    Degrees,
    Discard,
    Distance,
    Dot,
    Exp,
    Exp2,
    Floor,
    Frac,
    InverseSqrt,
    Length,
    Lerp,
    Log,
    Log2,
    Max,
    Min,
    Normalize,
    Pow,
    Radians,
    Reflect,
    Refract,
    Round,
    Sample,
    SampleLevel,
    Saturate,
    Sign,
    Sin,
    SmoothStep,
    Sqrt,
    Step,
    Tan,
    Transpose,
}

impl Intrinsic {
    pub fn from_name(name: &str) -> Option<Intrinsic> {
        use Intrinsic::*;
        let intrinsic = match name {
            "abs" => Abs,
            "acos" => Acos,
            "all" => All,
            "any" => Any,
            "asin" => Asin,
            "atan" => Atan,
            "atan2" => Atan2,
            "ceil" => Ceil,
            "clamp" => Clamp,
            "cos" => Cos,
            "cross" => Cross,
            "ddx" => Ddx,
            "ddy" => Ddy,
            "degrees" => Degrees,
            "discard" => Discard,
            "distance" => Distance,
            "dot" => Dot,
            "exp" => Exp,
            "exp2" => Exp2,
            "floor" => Floor,
            "frac" => Frac,
            "inverse_sqrt" => InverseSqrt,
            "length" => Length,
            "lerp" => Lerp,
            "log" => Log,
            "log2" => Log2,
            "max" => Max,
            "min" => Min,
            "normalize" => Normalize,
            "pow" => Pow,
            "radians" => Radians,
            "reflect" => Reflect,
            "refract" => Refract,
            "round" => Round,
            "sample" => Sample,
            "sample_level" => SampleLevel,
            "saturate" => Saturate,
            "sign" => Sign,
            "sin" => Sin,
            "smooth_step" => SmoothStep,
            "sqrt" => Sqrt,
            "step" => Step,
            "tan" => Tan,
            "transpose" => Transpose,
            _ => return None,
        };
        Some(intrinsic)
    }

    /// Function name emitted unless a backend overrides it.
    pub fn base_name(self) -> &'static str {
        use Intrinsic::*;
        match self {
            Abs => "abs",
            Acos => "acos",
            All => "all",
            Any => "any",
            Asin => "asin",
            Atan => "atan",
            Atan2 => "atan2",
            Ceil => "ceil",
            Clamp => "clamp",
            Cos => "cos",
            Cross => "cross",
            Ddx => "ddx",
            Ddy => "ddy",
            Degrees => "degrees",
            Discard => "discard",
            Distance => "distance",
            Dot => "dot",
            Exp => "exp",
            Exp2 => "exp2",
            Floor => "floor",
            Frac => "frac",
            InverseSqrt => "rsqrt",
            Length => "length",
            Lerp => "lerp",
            Log => "log",
            Log2 => "log2",
            Max => "max",
            Min => "min",
            Normalize => "normalize",
            Pow => "pow",
            Radians => "radians",
            Reflect => "reflect",
            Refract => "refract",
            Round => "round",
            Sample => "sample",
            SampleLevel => "sample_level",
            Saturate => "saturate",
            Sign => "sign",
            Sin => "sin",
            SmoothStep => "smoothstep",
            Sqrt => "sqrt",
            Step => "step",
            Tan => "tan",
            Transpose => "transpose",
        }
    }

    /// Accepted argument counts, counting the receiver of the method form.
    pub fn arity(self) -> (usize, usize) {
        use Intrinsic::*;
        match self {
            Discard => (0, 0),
            Atan2 | Cross | Distance | Dot | Max | Min | Pow | Reflect | Step => (2, 2),
            Clamp | Lerp | Refract | SmoothStep | SampleLevel => (3, 3),
            Sample => (2, 3),
            _ => (1, 1),
        }
    }

    pub fn describe_arity(self) -> String {
        match self.arity() {
            (min, max) if min == max => min.to_string(),
            (min, max) => format!("{} to {}", min, max),
        }
    }

    /// Result type given the argument types. Component-wise intrinsics take
    /// the type of their widest argument.
    pub fn result_type(self, args: &[Option<DataType>]) -> Option<DataType> {
        use Intrinsic::*;
        match self {
            All | Any => Some(DataType::Bool),
            Dot | Length | Distance => Some(DataType::Float),
            Cross => Some(DataType::Vector3),
            Sample | SampleLevel => Some(DataType::Vector4),
            Transpose => Some(DataType::Matrix),
            Discard => None,
            _ => args
                .iter()
                .flatten()
                .copied()
                .find(|ty| !ty.is_scalar())
                .or_else(|| args.first().copied().flatten()),
        }
    }
}
