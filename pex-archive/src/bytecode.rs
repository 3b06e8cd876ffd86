// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Classify Python bytecode by the magic number in its header.

A `.pyc` file starts with a 4 byte magic number: a little-endian 16-bit
value identifying the bytecode format followed by `\r\n`. Python 3.7
(PEP 552) changed the header layout, so bytecode on either side of that
boundary cannot be mixed freely.
*/

use byteorder::{ByteOrder, LittleEndian};

/// Magic number of Python 3.7rc1, the first to use the PEP 552 header.
pub const PYTHON37_MAGIC: u16 = 3394;

/// Magic numbers at or above this value belong to Python 2.
const PYTHON2_MAGIC_FLOOR: u16 = 20000;

/// Which side of the header layout boundary a bytecode blob is on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BytecodeGeneration {
    /// Before the threshold, or not recognizable as Python 3 bytecode.
    Legacy,
    /// At or after the threshold.
    Modern,
}

/// Classifies bytecode headers against a magic number threshold.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BytecodeMagicClassifier {
    threshold: u16,
}

impl Default for BytecodeMagicClassifier {
    fn default() -> Self {
        Self {
            threshold: PYTHON37_MAGIC,
        }
    }
}

impl BytecodeMagicClassifier {
    /// Construct an instance using a custom threshold.
    pub fn with_threshold(threshold: u16) -> Self {
        Self { threshold }
    }

    /// The magic number at which bytecode becomes [BytecodeGeneration::Modern].
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Whether the leading bytes of a bytecode blob are at or past the threshold.
    pub fn is_modern(&self, header: &[u8]) -> bool {
        if header.len() < 4 || &header[2..4] != b"\r\n" {
            return false;
        }

        let magic = LittleEndian::read_u16(&header[0..2]);

        magic >= self.threshold && magic < PYTHON2_MAGIC_FLOOR
    }

    /// Classify the leading bytes of a bytecode blob.
    pub fn classify(&self, header: &[u8]) -> BytecodeGeneration {
        if self.is_modern(header) {
            BytecodeGeneration::Modern
        } else {
            BytecodeGeneration::Legacy
        }
    }
}
