use super::Backend;
use crate::Result;

/// Input file backed by Memory
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new memory backend
    ///
    /// ## Arguments
    /// * 'data' - The data buffer to consume
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn data_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn into_data(self: Box<Self>) -> Vec<u8> {
        self.data
    }
}
