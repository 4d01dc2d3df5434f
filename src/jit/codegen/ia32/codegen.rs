use super::instruction::Instruction;

/*
    http://ref.x86asm.net/coder32.html most instructions come from this
    https://www.felixcloutier.com/x86/ for some specific commands

    Instructions are only ever appended, the order they are pushed is the order the CPU
    walks them in.
*/

#[derive(Debug, Default)]
pub struct InstructionStream {
    instructions: Vec<Instruction>,
}

impl InstructionStream {
    pub fn new() -> Self {
        InstructionStream {
            instructions: vec![],
        }
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Length in bytes once encoded
    pub fn len(&self) -> usize {
        self.instructions.iter().map(Instruction::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn to_vec_u8(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.len());
        for instruction in self.instructions.iter() {
            instruction.write_out(&mut result);
        }

        result
    }

    /// (byte offset, instruction) pairs, used for listings
    pub fn offsets(&self) -> impl Iterator<Item = (usize, &Instruction)> + '_ {
        self.instructions.iter().scan(0, |offset, inst| {
            let start = *offset;
            *offset += inst.len();
            Some((start, inst))
        })
    }
}
