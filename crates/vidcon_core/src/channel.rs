/*
    VidCon
    Register-programmable video controller emulator

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    channel.rs

    Single-slot crossbeam link between the control and render clock domains.

*/

//! Single-slot bidirectional crossbeam channel.
//!
//! Each direction holds at most one message, which matches the peripheral's rule that only
//! one instruction (and so only one completion) can ever be in flight.

use crossbeam_channel::{self, Receiver, Sender, TryRecvError, TrySendError};

pub struct DomainLink<Tx, Rx> {
    sender:   Sender<Tx>,
    receiver: Receiver<Rx>,
}

impl<Tx, Rx> DomainLink<Tx, Rx> {
    /// Create both ends of a link. The first end sends `Tx` and receives `Rx`, the second
    /// end the reverse.
    pub fn new_pair() -> (Self, DomainLink<Rx, Tx>) {
        let (sender_a, receiver_a) = crossbeam_channel::bounded(1);
        let (sender_b, receiver_b) = crossbeam_channel::bounded(1);
        (
            Self {
                sender:   sender_a,
                receiver: receiver_b,
            },
            DomainLink {
                sender:   sender_b,
                receiver: receiver_a,
            },
        )
    }

    pub fn try_send(&self, value: Tx) -> Result<(), TrySendError<Tx>> {
        self.sender.try_send(value)
    }

    pub fn try_recv(&self) -> Result<Rx, TryRecvError> {
        self.receiver.try_recv()
    }

    /// True if our outgoing slot is occupied and the other side has not consumed it yet.
    pub fn outgoing_full(&self) -> bool {
        self.sender.is_full()
    }

    /// Discard anything waiting in our incoming slot.
    pub fn drain(&self) {
        while self.receiver.try_recv().is_ok() {}
    }
}
