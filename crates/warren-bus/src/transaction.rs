#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseStatus {
    #[default]
    Incomplete,
    Ok,
    AddressError,
    CommandError,
    GenericError,
}

impl ResponseStatus {
    pub fn is_error(self) -> bool {
        !matches!(self, ResponseStatus::Ok | ResponseStatus::Incomplete)
    }
}

/// Phases of the pipelined transport protocol. The fabric only implements blocking transport;
/// these exist so a rejected non-blocking call can say which phase it was attempted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BeginRequest,
    EndRequest,
    BeginResponse,
    EndResponse,
}

/// Data carried by a transaction: the destination buffer of a read or the source of a write.
#[derive(Debug)]
pub enum Payload<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

/// A single bus access.
///
/// The address is absolute when the initiator issues the transaction; a router rewrites it into
/// the selected target's local space before forwarding.
#[derive(Debug)]
pub struct Transaction<'a> {
    address: u64,
    payload: Payload<'a>,
    response: ResponseStatus,
}

impl<'a> Transaction<'a> {
    pub fn read(address: u64, dst: &'a mut [u8]) -> Self {
        Self {
            address,
            payload: Payload::Read(dst),
            response: ResponseStatus::Incomplete,
        }
    }

    pub fn write(address: u64, src: &'a [u8]) -> Self {
        Self {
            address,
            payload: Payload::Write(src),
            response: ResponseStatus::Incomplete,
        }
    }

    /// A zero-length transaction used to ask for a direct-access window at `address`.
    pub fn probe(address: u64, command: Command) -> Self {
        let payload = match command {
            Command::Read => Payload::Read(&mut []),
            Command::Write => Payload::Write(&[]),
        };
        Self {
            address,
            payload,
            response: ResponseStatus::Incomplete,
        }
    }

    #[inline]
    pub fn address(&self) -> u64 {
        self.address
    }

    #[inline]
    pub fn set_address(&mut self, address: u64) {
        self.address = address;
    }

    pub fn command(&self) -> Command {
        match self.payload {
            Payload::Read(_) => Command::Read,
            Payload::Write(_) => Command::Write,
        }
    }

    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Read(dst) => dst.len(),
            Payload::Write(src) => src.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn payload_mut(&mut self) -> &mut Payload<'a> {
        &mut self.payload
    }

    pub fn response(&self) -> ResponseStatus {
        self.response
    }

    pub fn set_response(&mut self, response: ResponseStatus) {
        self.response = response;
    }
}
