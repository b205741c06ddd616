//! Typed composition over the cursor primitives.
//!
//! [`Encode`] and [`Decode`] are the user hook for custom composite types:
//! implement both in terms of the primitives and the type can travel
//! anywhere a primitive can, including as an RPC argument or result.
//! Tuples up to arity 8 are provided so argument lists marshal as a unit.

use crate::error::Result;
use crate::reader::InMessage;
use crate::remote::RemotePtr;
use crate::writer::OutMessage;

/// Append a value to an [`OutMessage`] in its wire encoding.
pub trait Encode {
    fn encode(&self, out: &mut OutMessage) -> Result<()>;
}

/// Extract a value from an [`InMessage`] in its wire encoding.
pub trait Decode: Sized {
    fn decode(input: &mut InMessage) -> Result<Self>;
}

impl Encode for u32 {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_u32(*self)
    }
}

impl Encode for i32 {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_i32(*self)
    }
}

impl Encode for u64 {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_u64(*self)
    }
}

impl Encode for i64 {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_i64(*self)
    }
}

impl Encode for f64 {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_f64(*self)
    }
}

impl Encode for u8 {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_u8(*self)
    }
}

impl Encode for &str {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_str(self)
    }
}

impl Encode for String {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_str(self)
    }
}

impl Encode for &[u8] {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_blob(self)
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_blob(self)
    }
}

impl Encode for RemotePtr {
    fn encode(&self, out: &mut OutMessage) -> Result<()> {
        out.write_remote_ptr(*self)
    }
}

impl Decode for u32 {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_u32()
    }
}

impl Decode for i32 {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_i32()
    }
}

impl Decode for u64 {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_u64()
    }
}

impl Decode for i64 {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_i64()
    }
}

impl Decode for f64 {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_f64()
    }
}

impl Decode for u8 {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_u8()
    }
}

impl Decode for String {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_str()
    }
}

impl Decode for Vec<u8> {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_blob()
    }
}

impl Decode for RemotePtr {
    fn decode(input: &mut InMessage) -> Result<Self> {
        input.read_remote_ptr()
    }
}

/// Void: encodes to nothing, decodes from nothing.
impl Encode for () {
    fn encode(&self, _out: &mut OutMessage) -> Result<()> {
        Ok(())
    }
}

impl Decode for () {
    fn decode(_input: &mut InMessage) -> Result<Self> {
        Ok(())
    }
}

macro_rules! tuple_codec {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            fn encode(&self, out: &mut OutMessage) -> Result<()> {
                let ($($name,)+) = self;
                $($name.encode(out)?;)+
                Ok(())
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode(input: &mut InMessage) -> Result<Self> {
                Ok(($($name::decode(input)?,)+))
            }
        }
    };
}

tuple_codec!(A);
tuple_codec!(A, B);
tuple_codec!(A, B, C);
tuple_codec!(A, B, C, D);
tuple_codec!(A, B, C, D, E);
tuple_codec!(A, B, C, D, E, F);
tuple_codec!(A, B, C, D, E, F, G);
tuple_codec!(A, B, C, D, E, F, G, H);
